//! ICMP traceroute driver implementation.

use crate::classify::classify;
use crate::packet::{build_echo_request, Probe};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use traceroute_core::{ProbeResponse, TracerouteDriver, TracerouteError, TracerouteParams};
use traceroute_packets::{RawSocket, SocketFactory};
use tracing::{trace, warn};

/// Receive buffer size; large enough for any reply to a 16-byte probe.
const RECV_BUFFER_LEN: usize = 1500;

/// ICMP traceroute driver.
///
/// Every attempt opens a fresh socket with the attempt's TTL and closes it
/// again before returning.
pub struct IcmpDriver {
    /// Target IP address.
    target_ip: IpAddr,
    /// Opens one socket per attempt.
    factory: Box<dyn SocketFactory>,
    /// Echo ID for this traceroute session.
    echo_id: u16,
    /// Echo sequence number.
    sequence: u16,
    /// Read buffer.
    buffer: Vec<u8>,
    /// Probes sent so far.
    transmitted: u32,
}

impl IcmpDriver {
    /// Creates a new ICMP driver.
    pub fn new(
        target_ip: IpAddr,
        factory: Box<dyn SocketFactory>,
        params: &TracerouteParams,
    ) -> Result<Self, TracerouteError> {
        if target_ip.is_ipv6() {
            return Err(TracerouteError::InvalidParams(format!(
                "IPv6 target {} is not supported",
                target_ip
            )));
        }

        Ok(Self {
            target_ip,
            factory,
            echo_id: params.identifier,
            sequence: params.sequence,
            buffer: vec![0u8; RECV_BUFFER_LEN],
            transmitted: 0,
        })
    }

    /// Sends one probe over `socket` and waits for the first usable reply.
    async fn exchange(
        &mut self,
        socket: &mut dyn RawSocket,
        ttl: u8,
        timeout: Duration,
    ) -> Result<Option<ProbeResponse>, TracerouteError> {
        let packet = build_echo_request(self.echo_id, self.sequence)?;

        trace!(
            ttl = ttl,
            echo_id = self.echo_id,
            "Sending ICMP Echo Request probe"
        );
        socket.send_to(packet.as_bytes(), self.target_ip).await?;
        self.transmitted += 1;

        let probe = Probe {
            ttl,
            identifier: self.echo_id,
            sequence: self.sequence,
            sent_at: Instant::now(),
        };
        let deadline = probe.sent_at + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !socket.wait_readable(remaining).await? {
                return Ok(None);
            }

            let (n, from) = match socket.recv_from(&mut self.buffer).await {
                Ok(Some(read)) => read,
                Ok(None) => continue,
                Err(e) if e.is_retryable() => {
                    trace!(ttl = ttl, error = %e, "Ignored unreadable packet");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let received_at = Instant::now();

            match classify(&self.buffer[..n]) {
                Ok(outcome) => match outcome.response_kind() {
                    Some(kind) => {
                        trace!(
                            ttl = probe.ttl,
                            echo_id = probe.identifier,
                            sequence = probe.sequence,
                            from = %from,
                            ?kind,
                            "Reply matched to probe"
                        );
                        return Ok(Some(ProbeResponse {
                            ttl: probe.ttl,
                            ip: from,
                            rtt: received_at.duration_since(probe.sent_at),
                            kind,
                        }));
                    }
                    None => {
                        trace!(ttl = ttl, from = %from, "Ignored unrecognized ICMP message");
                    }
                },
                Err(e) if e.is_retryable() => {
                    trace!(ttl = ttl, from = %from, error = %e, "Ignored malformed packet");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl TracerouteDriver for IcmpDriver {
    async fn attempt(
        &mut self,
        ttl: u8,
        timeout: Duration,
    ) -> Result<Option<ProbeResponse>, TracerouteError> {
        let mut socket = self.factory.open(ttl)?;

        let result = self.exchange(socket.as_mut(), ttl, timeout).await;

        if let Err(e) = socket.close().await {
            warn!(ttl = ttl, error = %e, "Failed to close socket");
        }

        result
    }

    fn transmitted(&self) -> u32 {
        self.transmitted
    }
}
