//! Raw ICMPv4 sockets for unix platforms, driven by tokio's reactor.

use crate::{RawSocket, SocketFactory};
use async_trait::async_trait;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::mem::MaybeUninit;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use traceroute_core::TracerouteError;
use tracing::trace;

/// Raw ICMPv4 socket with a fixed outgoing TTL.
///
/// The descriptor is released by [`RawSocket::close`] or, at the latest,
/// when the socket is dropped.
pub struct IcmpSocket {
    inner: Option<AsyncFd<Socket>>,
    ttl: u8,
}

impl IcmpSocket {
    /// Creates a non-blocking raw ICMP socket. Needs CAP_NET_RAW or root.
    pub fn open(ttl: u8) -> Result<Self, TracerouteError> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
            .map_err(TracerouteError::SocketCreation)?;
        socket
            .set_ttl(ttl as u32)
            .map_err(|source| TracerouteError::SetTtl { ttl, source })?;
        socket
            .set_nonblocking(true)
            .map_err(TracerouteError::SocketCreation)?;

        let inner = AsyncFd::new(socket).map_err(TracerouteError::SocketCreation)?;
        trace!(ttl = ttl, "Opened raw ICMP socket");

        Ok(Self {
            inner: Some(inner),
            ttl,
        })
    }

    fn fd(&self) -> Result<&AsyncFd<Socket>, TracerouteError> {
        self.inner
            .as_ref()
            .ok_or_else(|| TracerouteError::Internal("socket already closed".to_string()))
    }
}

#[async_trait]
impl RawSocket for IcmpSocket {
    async fn send_to(&mut self, buf: &[u8], addr: IpAddr) -> Result<(), TracerouteError> {
        // ICMP has no ports; the kernel ignores this one.
        let dest = SockAddr::from(SocketAddr::new(addr, 0));
        let fd = self.fd()?;

        loop {
            let mut guard = fd.writable().await.map_err(TracerouteError::WriteFailed)?;
            match guard.try_io(|inner| inner.get_ref().send_to(buf, &dest)) {
                Ok(result) => {
                    result.map_err(TracerouteError::WriteFailed)?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool, TracerouteError> {
        let fd = self.fd()?;
        match tokio::time::timeout(timeout, fd.readable()).await {
            Ok(Ok(_guard)) => Ok(true),
            Ok(Err(e)) => Err(TracerouteError::ReadFailed(e)),
            Err(_elapsed) => Ok(false),
        }
    }

    async fn recv_from(
        &mut self,
        buf: &mut [u8],
    ) -> Result<Option<(usize, IpAddr)>, TracerouteError> {
        let fd = self.fd()?;
        let mut guard = fd.readable().await.map_err(TracerouteError::ReadFailed)?;

        // SAFETY: the buffer is already initialized and recv_from only
        // writes initialized bytes into it.
        let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };

        match guard.try_io(|inner| inner.get_ref().recv_from(uninit)) {
            Ok(Ok((n, from))) => {
                let ip = from.as_socket().map(|s| s.ip()).ok_or_else(|| {
                    TracerouteError::MalformedPacket("sender is not an IP address".to_string())
                })?;
                Ok(Some((n, ip)))
            }
            Ok(Err(e)) => Err(TracerouteError::ReadFailed(e)),
            Err(_would_block) => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), TracerouteError> {
        if self.inner.take().is_some() {
            trace!(ttl = self.ttl, "Closed raw ICMP socket");
        }
        Ok(())
    }
}

/// Opens [`IcmpSocket`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcmpSocketFactory;

impl SocketFactory for IcmpSocketFactory {
    fn open(&self, ttl: u8) -> Result<Box<dyn RawSocket>, TracerouteError> {
        Ok(Box::new(IcmpSocket::open(ttl)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "needs CAP_NET_RAW"]
    async fn test_open_and_close() {
        let mut socket = IcmpSocket::open(5).unwrap();
        assert!(socket.fd().is_ok());
        socket.close().await.unwrap();
        assert!(socket.fd().is_err());
        assert!(!socket
            .wait_readable(Duration::from_millis(1))
            .await
            .unwrap_or(false));
    }
}
