//! Raw socket transport for icmp-traceroute.
//!
//! Provides the capability traits the ICMP driver probes through, and the
//! platform implementation backing them.

pub mod platform;
pub mod socket;

pub use platform::new_socket_factory;
pub use socket::{RawSocket, SocketFactory};
