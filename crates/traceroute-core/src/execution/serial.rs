//! Serial traceroute execution.
//!
//! Probes one TTL at a time, with at most one attempt in flight, and hands
//! out hop results as they are resolved.

use crate::{
    HopResult, ResponseKind, Termination, TraceReport, TracerouteDriver, TracerouteError,
    TracerouteParams,
};
use std::net::IpAddr;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// State of one trace: the TTL loop with its retry, deadline and
/// cancellation rules.
///
/// Hops are pulled one at a time with [`TraceSession::next_hop`]. Once it
/// returns `Ok(None)` the session is finished and [`TraceSession::termination`]
/// says why. A finished session cannot be resumed; start a new one instead.
pub struct TraceSession<D> {
    driver: D,
    params: TracerouteParams,
    hostname: String,
    target: IpAddr,
    cancel: CancellationToken,
    next_ttl: u16,
    started_at: Instant,
    hops: Vec<HopResult>,
    termination: Option<Termination>,
}

impl<D: TracerouteDriver> TraceSession<D> {
    /// Starts a session. The runtime budget counts from here.
    pub fn new(
        driver: D,
        hostname: impl Into<String>,
        target: IpAddr,
        params: TracerouteParams,
        cancel: CancellationToken,
    ) -> Result<Self, TracerouteError> {
        params.validate()?;

        Ok(Self {
            driver,
            params,
            hostname: hostname.into(),
            target,
            cancel,
            next_ttl: 1,
            started_at: Instant::now(),
            hops: Vec::new(),
            termination: None,
        })
    }

    /// Probes the next TTL and returns its result.
    ///
    /// Returns `Ok(None)` once the trace has terminated. A transport error
    /// aborts only the TTL it happened on: the error is returned, and the
    /// next call moves on to the following TTL.
    pub async fn next_hop(&mut self) -> Result<Option<HopResult>, TracerouteError> {
        if self.termination.is_some() {
            return Ok(None);
        }
        if let Some(reason) = self.check_limits() {
            self.finish(reason);
            return Ok(None);
        }

        let ttl = self.next_ttl as u8;
        self.next_ttl += 1;

        let cancel = self.cancel.clone();
        let timeout = self.params.timeout;
        let mut response = None;

        for attempt in 1..=self.params.tries {
            if cancel.is_cancelled() {
                self.finish(Termination::Cancelled);
                return Ok(None);
            }

            debug!(ttl = ttl, attempt = attempt, "Sending probe");
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.driver.attempt(ttl, timeout) => Some(result),
            };
            let Some(result) = result else {
                self.finish(Termination::Cancelled);
                return Ok(None);
            };

            match result {
                Ok(Some(probe)) => {
                    debug!(
                        ttl = probe.ttl,
                        ip = %probe.ip,
                        rtt_ms = probe.rtt.as_secs_f64() * 1000.0,
                        kind = ?probe.kind,
                        "Received probe response"
                    );
                    response = Some(probe);
                    break;
                }
                Ok(None) => {
                    debug!(ttl = ttl, attempt = attempt, "Timeout waiting for response");
                }
                Err(e) if e.is_retryable() => {
                    trace!(ttl = ttl, error = %e, "Retryable error, counting as timeout");
                }
                Err(e) => {
                    warn!(ttl = ttl, error = %e, "Probe attempt failed");
                    return Err(e);
                }
            }
        }

        let hop = match response {
            None => HopResult::timed_out(ttl),
            Some(probe) => {
                match probe.kind {
                    ResponseKind::Hop => {}
                    ResponseKind::Destination => self.finish(Termination::Completed),
                    ResponseKind::Unreachable => self.finish(Termination::Unreachable),
                }
                HopResult::from_response(&probe)
            }
        };
        self.hops.push(hop.clone());

        Ok(Some(hop))
    }

    fn check_limits(&self) -> Option<Termination> {
        if self.cancel.is_cancelled() {
            return Some(Termination::Cancelled);
        }
        if self.next_ttl > self.params.max_hops as u16 {
            return Some(Termination::ExhaustedHops);
        }
        if self.started_at.elapsed() > self.params.max_runtime {
            return Some(Termination::DeadlineExceeded);
        }
        None
    }

    fn finish(&mut self, reason: Termination) {
        debug!(
            termination = %reason,
            hops = self.hops.len(),
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "Trace finished"
        );
        self.termination = Some(reason);
    }

    /// Why the trace ended, once it has.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Hops produced so far.
    pub fn hops(&self) -> &[HopResult] {
        &self.hops
    }

    /// Converts a finished session into its report.
    pub fn into_report(self) -> Option<TraceReport> {
        let termination = self.termination?;
        Some(TraceReport {
            hostname: self.hostname,
            target: self.target,
            hops: self.hops,
            termination,
            transmitted: self.driver.transmitted(),
        })
    }
}

/// Executes a whole trace and collects it into a report.
///
/// Transport errors end the run here; callers that want to continue past a
/// failing TTL should drive a [`TraceSession`] themselves.
pub async fn traceroute_serial<D: TracerouteDriver>(
    driver: D,
    hostname: &str,
    target: IpAddr,
    params: TracerouteParams,
    cancel: CancellationToken,
) -> Result<TraceReport, TracerouteError> {
    let mut session = TraceSession::new(driver, hostname, target, params, cancel)?;
    while session.next_hop().await?.is_some() {}

    session
        .into_report()
        .ok_or_else(|| TracerouteError::Internal("Trace ended without a termination".into()))
}
