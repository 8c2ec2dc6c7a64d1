//! Platform-specific raw socket implementations.

#[cfg(unix)]
pub mod unix;

use crate::SocketFactory;
use traceroute_core::TracerouteError;

/// Creates a socket factory appropriate for the current platform.
pub fn new_socket_factory() -> Result<Box<dyn SocketFactory>, TracerouteError> {
    #[cfg(unix)]
    return Ok(Box::new(unix::IcmpSocketFactory));

    #[cfg(not(unix))]
    return Err(TracerouteError::DriverNotAvailable);
}
