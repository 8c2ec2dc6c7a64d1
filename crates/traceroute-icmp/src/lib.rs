//! ICMP traceroute implementation.
//!
//! Probe construction ([`build_echo_request`], [`checksum`]), reply
//! classification ([`classify`]) and the [`IcmpDriver`] that runs single
//! probe attempts over a raw socket.

mod checksum;
mod classify;
mod driver;
mod packet;

pub use checksum::checksum;
pub use classify::{classify, Outcome, IPV4_HEADER_LEN};
pub use driver::IcmpDriver;
pub use packet::{
    build_echo_request, IcmpPacket, Probe, ECHO_REQUEST_LEN, ICMP_HEADER_LEN, TIMESTAMP_LEN,
};
