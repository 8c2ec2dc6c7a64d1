//! Classification of received ICMP messages.

use pnet_packet::icmp::{IcmpPacket, IcmpTypes};
use pnet_packet::ipv4::Ipv4Packet;
use traceroute_core::{ResponseKind, TracerouteError};

/// Length of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;

/// Shortest frame that carries a full ICMP header after the IP header.
const MIN_FRAME_LEN: usize = IPV4_HEADER_LEN + 8;

/// What a received ICMP message means for the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A router on the path dropped the probe (type 11).
    TimeExceeded,
    /// The target answered (type 0).
    EchoReply,
    /// Routing to the target failed (type 3).
    DestinationUnreachable,
    /// Anything else; not an answer to our probe.
    Unrecognized,
}

impl Outcome {
    /// The response kind this outcome reports, if it answers a probe.
    pub fn response_kind(self) -> Option<ResponseKind> {
        match self {
            Outcome::TimeExceeded => Some(ResponseKind::Hop),
            Outcome::EchoReply => Some(ResponseKind::Destination),
            Outcome::DestinationUnreachable => Some(ResponseKind::Unreachable),
            Outcome::Unrecognized => None,
        }
    }
}

/// Classifies a frame read from a raw ICMP socket.
///
/// The frame starts at the IPv4 header, which must be exactly 20 bytes: the
/// ICMP header is read at that fixed offset, so frames carrying IP options
/// are rejected as malformed. Only the ICMP type is inspected.
pub fn classify(frame: &[u8]) -> Result<Outcome, TracerouteError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(TracerouteError::PacketTooShort {
            expected: MIN_FRAME_LEN,
            actual: frame.len(),
        });
    }

    let ip = Ipv4Packet::new(frame)
        .ok_or_else(|| TracerouteError::MalformedPacket("Invalid IPv4 header".to_string()))?;
    if ip.get_version() != 4 {
        return Err(TracerouteError::MalformedPacket(format!(
            "Unexpected IP version {}",
            ip.get_version()
        )));
    }
    if ip.get_header_length() as usize * 4 != IPV4_HEADER_LEN {
        return Err(TracerouteError::MalformedPacket(format!(
            "IPv4 header carries options (IHL={})",
            ip.get_header_length()
        )));
    }

    let icmp = IcmpPacket::new(&frame[IPV4_HEADER_LEN..])
        .ok_or_else(|| TracerouteError::MalformedPacket("Invalid ICMP header".to_string()))?;
    let icmp_type = icmp.get_icmp_type();

    let outcome = if icmp_type == IcmpTypes::TimeExceeded {
        Outcome::TimeExceeded
    } else if icmp_type == IcmpTypes::EchoReply {
        Outcome::EchoReply
    } else if icmp_type == IcmpTypes::DestinationUnreachable {
        Outcome::DestinationUnreachable
    } else {
        Outcome::Unrecognized
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(icmp_type: u8, code: u8) -> Vec<u8> {
        let len = MIN_FRAME_LEN + 8;
        let mut buf = vec![0u8; len];
        buf[0] = 0x45;
        buf[2..4].copy_from_slice(&(len as u16).to_be_bytes());
        buf[8] = 64;
        buf[9] = 1;
        buf[12..16].copy_from_slice(&[10, 0, 0, 1]);
        buf[16..20].copy_from_slice(&[10, 0, 0, 2]);
        buf[20] = icmp_type;
        buf[21] = code;
        buf
    }

    #[test]
    fn test_classify_types() {
        assert_eq!(classify(&frame(11, 0)).unwrap(), Outcome::TimeExceeded);
        assert_eq!(classify(&frame(0, 0)).unwrap(), Outcome::EchoReply);
        assert_eq!(classify(&frame(3, 1)).unwrap(), Outcome::DestinationUnreachable);
        assert_eq!(classify(&frame(3, 3)).unwrap(), Outcome::DestinationUnreachable);
    }

    #[test]
    fn test_other_types_unrecognized() {
        for icmp_type in [4u8, 5, 8, 12, 13, 255] {
            assert_eq!(classify(&frame(icmp_type, 0)).unwrap(), Outcome::Unrecognized);
        }
    }

    #[test]
    fn test_checksum_not_validated() {
        let mut buf = frame(11, 0);
        buf[22] = 0xde;
        buf[23] = 0xad;
        assert_eq!(classify(&buf).unwrap(), Outcome::TimeExceeded);
    }

    #[test]
    fn test_ip_options_are_malformed() {
        let mut buf = frame(11, 0);
        buf[0] = 0x46;
        let err = classify(&buf).unwrap_err();
        assert!(matches!(err, TracerouteError::MalformedPacket(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_short_frame() {
        let err = classify(&frame(0, 0)[..24]).unwrap_err();
        assert!(matches!(
            err,
            TracerouteError::PacketTooShort {
                expected: 28,
                actual: 24
            }
        ));
    }

    #[test]
    fn test_not_ipv4() {
        let mut buf = frame(0, 0);
        buf[0] = 0x65;
        assert!(matches!(
            classify(&buf),
            Err(TracerouteError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_response_kinds() {
        assert_eq!(Outcome::TimeExceeded.response_kind(), Some(ResponseKind::Hop));
        assert_eq!(Outcome::EchoReply.response_kind(), Some(ResponseKind::Destination));
        assert_eq!(
            Outcome::DestinationUnreachable.response_kind(),
            Some(ResponseKind::Unreachable)
        );
        assert_eq!(Outcome::Unrecognized.response_kind(), None);
    }
}
