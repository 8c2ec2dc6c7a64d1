//! ICMP Echo Request construction.

use crate::checksum::checksum;
use pnet_packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet_packet::icmp::{IcmpCode, IcmpTypes};
use pnet_packet::Packet;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use traceroute_core::TracerouteError;

/// Length of the ICMP echo header.
pub const ICMP_HEADER_LEN: usize = 8;

/// Length of the timestamp payload.
pub const TIMESTAMP_LEN: usize = 8;

/// Total length of an outbound probe.
pub const ECHO_REQUEST_LEN: usize = ICMP_HEADER_LEN + TIMESTAMP_LEN;

/// One transmitted probe attempt.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub ttl: u8,
    pub identifier: u16,
    pub sequence: u16,
    /// When the packet left the socket.
    pub sent_at: Instant,
}

/// An ICMP message as raw bytes, starting at the ICMP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpPacket {
    bytes: Vec<u8>,
}

impl IcmpPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builds an ICMP Echo Request stamped with the current time.
///
/// The payload is the send time in seconds since the UNIX epoch, as a
/// big-endian `f64`.
pub fn build_echo_request(identifier: u16, sequence: u16) -> Result<IcmpPacket, TracerouteError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    let mut bytes = vec![0u8; ECHO_REQUEST_LEN];
    {
        let mut echo = MutableEchoRequestPacket::new(&mut bytes)
            .ok_or_else(|| TracerouteError::Internal("Failed to create ICMP packet".to_string()))?;

        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode::new(0));
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        echo.set_payload(&now.to_be_bytes());

        // Checksum field is still zero here.
        let sum = checksum(echo.packet());
        echo.set_checksum(sum);
    }

    Ok(IcmpPacket { bytes })
}
