//! Traceroute runner that orchestrates the entire traceroute process.

use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;
use traceroute_core::{
    HopResult, TraceReport, TraceSession, TracerouteConfig, TracerouteError,
};
use traceroute_icmp::IcmpDriver;
use traceroute_packets::{new_socket_factory, SocketFactory};
use tracing::{debug, info};

/// Resolve a hostname to an IPv4 address.
pub async fn resolve_hostname(hostname: &str) -> Result<IpAddr, TracerouteError> {
    let failed = |reason: String| TracerouteError::ResolutionFailed {
        hostname: hostname.to_string(),
        reason,
    };

    // First check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        if ip.is_ipv6() {
            return Err(failed("IPv6 targets are not supported".to_string()));
        }
        return Ok(ip);
    }

    let resolver = TokioAsyncResolver::tokio_from_system_conf()
        .map_err(|e| failed(format!("Failed to create DNS resolver: {}", e)))?;

    let lookup = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| failed(e.to_string()))?;

    lookup
        .iter()
        .find(IpAddr::is_ipv4)
        .ok_or_else(|| failed("No IPv4 address found".to_string()))
}

/// Run the full traceroute, reporting every hop as soon as it is known.
pub async fn run_traceroute<F>(
    config: &TracerouteConfig,
    cancel: CancellationToken,
    on_hop: F,
) -> Result<TraceReport, TracerouteError>
where
    F: FnMut(&HopResult),
{
    info!(
        target = %config.hostname,
        max_hops = config.params.max_hops,
        tries = config.params.tries,
        max_probes = config.params.max_transmissions(),
        "Starting traceroute"
    );

    // Resolve hostname to IP
    let target_ip = resolve_hostname(&config.hostname).await?;
    debug!("Resolved {} to {}", config.hostname, target_ip);

    let factory = new_socket_factory()?;
    run_with_factory(config, target_ip, factory, cancel, on_hop).await
}

/// Runs the trace against an already resolved address over the given sockets.
///
/// A transport failure ends the run with that error.
pub async fn run_with_factory<F>(
    config: &TracerouteConfig,
    target_ip: IpAddr,
    factory: Box<dyn SocketFactory>,
    cancel: CancellationToken,
    mut on_hop: F,
) -> Result<TraceReport, TracerouteError>
where
    F: FnMut(&HopResult),
{
    let driver = IcmpDriver::new(target_ip, factory, &config.params)?;
    let mut session = TraceSession::new(
        driver,
        config.hostname.as_str(),
        target_ip,
        config.params.clone(),
        cancel,
    )?;

    while let Some(hop) = session.next_hop().await? {
        on_hop(&hop);
    }

    let report = session
        .into_report()
        .ok_or_else(|| TracerouteError::Internal("Trace ended without a termination".into()))?;
    info!(
        termination = %report.termination,
        hops = report.hops.len(),
        responding = report.responding_hops(),
        reached_target = report.reached_target(),
        transmitted = report.transmitted,
        "Traceroute finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use traceroute_core::{HopStatus, Termination, TracerouteParams};
    use traceroute_packets::RawSocket;

    /// Routers answer at every TTL below `hops`, the target at `hops`.
    struct Path {
        hops: u8,
    }

    struct PathSocket {
        reply: Option<(Vec<u8>, IpAddr)>,
    }

    impl SocketFactory for Path {
        fn open(&self, ttl: u8) -> Result<Box<dyn RawSocket>, TracerouteError> {
            let (icmp_type, from) = if ttl < self.hops {
                (11, IpAddr::from([10, 0, 0, ttl]))
            } else {
                (0, IpAddr::from([192, 0, 2, 1]))
            };
            let mut frame = vec![0u8; 28];
            frame[0] = 0x45;
            frame[20] = icmp_type;
            Ok(Box::new(PathSocket {
                reply: Some((frame, from)),
            }))
        }
    }

    #[async_trait]
    impl RawSocket for PathSocket {
        async fn send_to(&mut self, _buf: &[u8], _addr: IpAddr) -> Result<(), TracerouteError> {
            Ok(())
        }

        async fn wait_readable(&mut self, _timeout: Duration) -> Result<bool, TracerouteError> {
            Ok(self.reply.is_some())
        }

        async fn recv_from(
            &mut self,
            buf: &mut [u8],
        ) -> Result<Option<(usize, IpAddr)>, TracerouteError> {
            Ok(self.reply.take().map(|(frame, from)| {
                buf[..frame.len()].copy_from_slice(&frame);
                (frame.len(), from)
            }))
        }

        async fn close(&mut self) -> Result<(), TracerouteError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resolve_ip_address() {
        let result = resolve_hostname("8.8.8.8").await;
        assert_eq!(result.unwrap(), IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[tokio::test]
    async fn test_resolve_rejects_ipv6() {
        let result = resolve_hostname("2001:db8::1").await;
        assert!(matches!(
            result,
            Err(TracerouteError::ResolutionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_reports_each_hop() {
        let config = TracerouteConfig {
            hostname: "example.test".to_string(),
            params: TracerouteParams::default(),
            json: false,
        };

        let mut seen = Vec::new();
        let report = run_with_factory(
            &config,
            IpAddr::from([192, 0, 2, 1]),
            Box::new(Path { hops: 3 }),
            CancellationToken::new(),
            |hop| seen.push(hop.ttl),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(report.termination, Termination::Completed);
        assert!(report.reached_target());
        assert_eq!(report.responding_hops(), 3);
        assert_eq!(report.hostname, "example.test");
        assert!(report.hops.iter().all(|h| h.status == HopStatus::Replied));
        assert_eq!(report.transmitted, 3);
    }
}
