//! Core types for traceroute operations.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Default number of TTL values probed.
pub const DEFAULT_MAX_HOPS: u8 = 30;
/// Default wait per attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
/// Default attempts per TTL.
pub const DEFAULT_TRIES: u8 = 2;
/// Default budget for the whole trace.
pub const DEFAULT_MAX_RUNTIME: Duration = Duration::from_secs(10);
/// Echo sequence number carried by every probe.
pub const DEFAULT_SEQUENCE: u16 = 1;

/// What kind of ICMP message answered a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Time Exceeded from a router on the path.
    Hop,
    /// Echo Reply from the target itself.
    Destination,
    /// Destination Unreachable.
    Unreachable,
}

/// Response to a single probe attempt.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// The TTL that was used for this probe.
    pub ttl: u8,
    /// The IP address that responded.
    pub ip: IpAddr,
    /// Round-trip time for this probe.
    pub rtt: Duration,
    /// Which message came back.
    pub kind: ResponseKind,
}

/// Parameters for traceroute execution.
#[derive(Debug, Clone)]
pub struct TracerouteParams {
    /// Highest TTL to probe; the first is always 1.
    pub max_hops: u8,
    /// How long one attempt waits for a usable reply.
    pub timeout: Duration,
    /// Attempts per TTL before the hop counts as timed out.
    pub tries: u8,
    /// Budget for the whole trace, checked before each TTL.
    pub max_runtime: Duration,
    /// ICMP echo identifier.
    pub identifier: u16,
    /// ICMP echo sequence number.
    pub sequence: u16,
}

impl Default for TracerouteParams {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            timeout: DEFAULT_TIMEOUT,
            tries: DEFAULT_TRIES,
            max_runtime: DEFAULT_MAX_RUNTIME,
            identifier: process_identifier(),
            sequence: DEFAULT_SEQUENCE,
        }
    }
}

impl TracerouteParams {
    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), crate::TracerouteError> {
        if self.max_hops == 0 {
            return Err(crate::TracerouteError::InvalidParams(
                "max_hops must be at least 1".to_string(),
            ));
        }
        if self.tries == 0 {
            return Err(crate::TracerouteError::InvalidParams(
                "tries must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(crate::TracerouteError::InvalidParams(
                "timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on probes a single trace may transmit.
    pub fn max_transmissions(&self) -> u32 {
        self.max_hops as u32 * self.tries as u32
    }
}

/// Echo identifier derived from the current process id.
pub fn process_identifier() -> u16 {
    (std::process::id() & 0xFFFF) as u16
}

/// Outcome of probing one TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopStatus {
    Replied,
    TimedOut,
    Unreachable,
}

impl std::fmt::Display for HopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HopStatus::Replied => write!(f, "replied"),
            HopStatus::TimedOut => write!(f, "timed_out"),
            HopStatus::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Result for a single TTL, emitted once all attempts are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopResult {
    /// The TTL for this hop.
    pub ttl: u8,
    pub status: HopStatus,
    /// Round-trip time in whole milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_trip_millis: Option<u64>,
    /// The address that answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responder: Option<IpAddr>,
}

impl HopResult {
    /// A hop whose attempts all ran out of time.
    pub fn timed_out(ttl: u8) -> Self {
        Self {
            ttl,
            status: HopStatus::TimedOut,
            round_trip_millis: None,
            responder: None,
        }
    }

    /// Builds the hop result for a probe response.
    pub fn from_response(response: &ProbeResponse) -> Self {
        let status = match response.kind {
            ResponseKind::Hop | ResponseKind::Destination => HopStatus::Replied,
            ResponseKind::Unreachable => HopStatus::Unreachable,
        };
        Self {
            ttl: response.ttl,
            status,
            round_trip_millis: Some(response.rtt.as_millis() as u64),
            responder: Some(response.ip),
        }
    }
}

/// Why a trace stopped producing hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The target sent an Echo Reply.
    Completed,
    /// A Destination Unreachable ended the trace.
    Unreachable,
    /// The overall runtime budget ran out.
    DeadlineExceeded,
    /// Every TTL up to `max_hops` was probed without reaching the target.
    ExhaustedHops,
    /// The caller cancelled the trace.
    Cancelled,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Completed => write!(f, "completed"),
            Termination::Unreachable => write!(f, "unreachable"),
            Termination::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Termination::ExhaustedHops => write!(f, "exhausted_hops"),
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// High-level traceroute configuration.
#[derive(Debug, Clone, Default)]
pub struct TracerouteConfig {
    /// Target hostname or IP address.
    pub hostname: String,
    /// Traceroute parameters.
    pub params: TracerouteParams,
    /// Print the final report as JSON instead of hop lines.
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traceroute_params_defaults() {
        let params = TracerouteParams::default();
        assert_eq!(params.max_hops, 30);
        assert_eq!(params.timeout, Duration::from_secs(2));
        assert_eq!(params.tries, 2);
        assert_eq!(params.max_runtime, Duration::from_secs(10));
        assert_eq!(params.sequence, 1);
        assert_eq!(params.max_transmissions(), 60);
    }

    #[test]
    fn test_traceroute_params_validate() {
        assert!(TracerouteParams::default().validate().is_ok());

        let no_hops = TracerouteParams {
            max_hops: 0,
            ..Default::default()
        };
        assert!(no_hops.validate().is_err());

        let no_tries = TracerouteParams {
            tries: 0,
            ..Default::default()
        };
        assert!(no_tries.validate().is_err());

        let no_timeout = TracerouteParams {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_hop_from_response() {
        let response = ProbeResponse {
            ttl: 4,
            ip: "10.0.0.4".parse().unwrap(),
            rtt: Duration::from_micros(12_900),
            kind: ResponseKind::Unreachable,
        };
        let hop = HopResult::from_response(&response);
        assert_eq!(hop.status, HopStatus::Unreachable);
        assert_eq!(hop.round_trip_millis, Some(12));
        assert_eq!(hop.responder, Some("10.0.0.4".parse().unwrap()));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&HopResult::timed_out(7)).unwrap();
        assert_eq!(json, r#"{"ttl":7,"status":"timed_out"}"#);
        assert_eq!(
            serde_json::to_string(&Termination::DeadlineExceeded).unwrap(),
            r#""deadline_exceeded""#
        );
    }
}
