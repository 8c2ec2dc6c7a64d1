//! Error types for traceroute operations.

use thiserror::Error;

/// Main error type for traceroute operations.
#[derive(Error, Debug)]
pub enum TracerouteError {
    // DNS errors
    #[error("Failed to resolve hostname {hostname}: {reason}")]
    ResolutionFailed { hostname: String, reason: String },

    // Socket/IO errors
    #[error("Failed to create raw ICMP socket: {0}")]
    SocketCreation(#[source] std::io::Error),

    #[error("Failed to set TTL {ttl} on socket: {source}")]
    SetTtl {
        ttl: u8,
        #[source]
        source: std::io::Error,
    },

    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    // Packet errors
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    // Driver errors
    #[error("Raw sockets are not available on this platform")]
    DriverNotAvailable,

    // Configuration errors
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TracerouteError {
    /// Returns true if this error only spoils the current attempt.
    ///
    /// Raw ICMP sockets see every ICMP packet addressed to the host, so a
    /// frame we cannot make sense of is no reason to give up on the hop.
    /// The engine counts these like an attempt that timed out.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MalformedPacket(_) | Self::PacketTooShort { .. }
        )
    }

    /// Returns true if this error came from the raw socket itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::SocketCreation(_)
                | Self::SetTtl { .. }
                | Self::WriteFailed(_)
                | Self::ReadFailed(_)
                | Self::DriverNotAvailable
        )
    }
}

/// Result type alias for traceroute operations.
pub type TracerouteResult<T> = Result<T, TracerouteError>;
