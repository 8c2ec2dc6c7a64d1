//! Core trait for traceroute driver implementations.

use crate::{ProbeResponse, TracerouteError};
use async_trait::async_trait;
use std::time::Duration;

/// Runs single probe attempts for the serial engine.
///
/// An attempt owns every resource it needs: it opens its socket with the
/// requested TTL, transmits one probe, waits for a usable reply and releases
/// the socket before returning. Dropping the attempt future must also
/// release it, which is how cancellation interrupts an attempt.
#[async_trait]
pub trait TracerouteDriver: Send {
    /// Sends one probe with the given TTL and waits up to `timeout` for a reply.
    ///
    /// Returns `Ok(None)` if no usable response arrived in time.
    /// Returns `Err` for transport failures; retryable errors are treated
    /// like a timeout by the caller.
    async fn attempt(
        &mut self,
        ttl: u8,
        timeout: Duration,
    ) -> Result<Option<ProbeResponse>, TracerouteError>;

    /// Number of probes transmitted so far.
    fn transmitted(&self) -> u32;
}
