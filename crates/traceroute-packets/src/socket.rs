//! Raw socket capability traits.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use traceroute_core::TracerouteError;

/// One raw ICMP socket, owned by a single probe attempt.
#[async_trait]
pub trait RawSocket: Send {
    /// Sends an ICMP message (no IP header) to the given address.
    async fn send_to(&mut self, buf: &[u8], addr: IpAddr) -> Result<(), TracerouteError>;

    /// Waits until a packet can be read, or the timeout passes.
    ///
    /// Returns `Ok(false)` on timeout.
    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool, TracerouteError>;

    /// Reads one packet (starting at the IP header) into the buffer.
    ///
    /// Returns the number of bytes read and the sender, or `Ok(None)` if the
    /// readiness reported by [`RawSocket::wait_readable`] was spurious.
    async fn recv_from(
        &mut self,
        buf: &mut [u8],
    ) -> Result<Option<(usize, IpAddr)>, TracerouteError>;

    /// Closes the socket.
    async fn close(&mut self) -> Result<(), TracerouteError>;
}

/// Opens raw ICMP sockets.
pub trait SocketFactory: Send + Sync {
    /// Opens a socket whose outgoing packets carry the given IP TTL.
    fn open(&self, ttl: u8) -> Result<Box<dyn RawSocket>, TracerouteError>;
}
