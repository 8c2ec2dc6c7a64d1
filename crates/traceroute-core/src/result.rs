//! Result types for traceroute output.

use crate::{HopResult, HopStatus, Termination};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Complete result of one trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    /// Target as given by the user.
    pub hostname: String,
    /// Address the probes were sent to.
    pub target: IpAddr,
    /// One entry per probed TTL, in order.
    pub hops: Vec<HopResult>,
    /// Why the trace ended.
    pub termination: Termination,
    /// Number of probes transmitted.
    pub transmitted: u32,
}

impl TraceReport {
    /// Returns true if the target itself answered.
    pub fn reached_target(&self) -> bool {
        self.termination == Termination::Completed
    }

    /// Number of hops that answered at all.
    pub fn responding_hops(&self) -> usize {
        self.hops
            .iter()
            .filter(|h| h.status != HopStatus::TimedOut)
            .count()
    }

    /// Serializes the report to JSON with indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
