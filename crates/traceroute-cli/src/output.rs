//! Terminal rendering of hop results.

use traceroute_core::{HopResult, HopStatus, Termination, TracerouteParams};

/// Renders one hop as a tab separated line.
pub fn format_hop(hop: &HopResult) -> String {
    match hop.status {
        HopStatus::Replied => format!(
            "  {}\trtt={} ms\t{}",
            hop.ttl,
            hop.round_trip_millis.unwrap_or_default(),
            hop.responder
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "*".to_string())
        ),
        HopStatus::TimedOut => format!("  {}\t*\t*\t*\tRequest timed out.", hop.ttl),
        HopStatus::Unreachable => format!("  {}\tDestination Unreachable", hop.ttl),
    }
}

/// Closing line for terminations that are not obvious from the last hop.
pub fn format_termination(termination: Termination, params: &TracerouteParams) -> Option<String> {
    match termination {
        Termination::Completed | Termination::Unreachable => None,
        Termination::DeadlineExceeded => Some(format!(
            "\nExecution time limit reached ({} seconds). Stopping trace.",
            params.max_runtime.as_secs()
        )),
        Termination::ExhaustedHops => Some(format!(
            "\nDestination not reached within {} hops.",
            params.max_hops
        )),
        Termination::Cancelled => {
            Some("\nTraceroute interrupted by user. Exiting gracefully.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_replied() {
        let hop = HopResult {
            ttl: 3,
            status: HopStatus::Replied,
            round_trip_millis: Some(17),
            responder: Some("10.1.2.3".parse().unwrap()),
        };
        assert_eq!(format_hop(&hop), "  3\trtt=17 ms\t10.1.2.3");
    }

    #[test]
    fn test_format_timed_out() {
        assert_eq!(
            format_hop(&HopResult::timed_out(12)),
            "  12\t*\t*\t*\tRequest timed out."
        );
    }

    #[test]
    fn test_format_unreachable() {
        let hop = HopResult {
            ttl: 5,
            status: HopStatus::Unreachable,
            round_trip_millis: Some(40),
            responder: Some("10.9.9.9".parse().unwrap()),
        };
        assert_eq!(format_hop(&hop), "  5\tDestination Unreachable");
    }

    #[test]
    fn test_format_termination() {
        let params = TracerouteParams::default();
        assert_eq!(format_termination(Termination::Completed, &params), None);
        assert_eq!(
            format_termination(Termination::DeadlineExceeded, &params).unwrap(),
            "\nExecution time limit reached (10 seconds). Stopping trace."
        );
        assert!(format_termination(Termination::Cancelled, &params)
            .unwrap()
            .contains("interrupted by user"));
        assert!(format_termination(Termination::ExhaustedHops, &params)
            .unwrap()
            .contains("30 hops"));
    }
}
