//! Core types, traits, and error handling for icmp-traceroute.
//!
//! This crate provides the fundamental abstractions used throughout the
//! traceroute implementation:
//!
//! - [`TracerouteDriver`] trait for running single probe attempts
//! - [`TraceSession`], the TTL loop with its retry and deadline rules
//! - [`HopResult`], [`Termination`] and other core types
//! - [`TracerouteError`] for error handling

pub mod error;
pub mod execution;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{TracerouteError, TracerouteResult};
pub use execution::{traceroute_serial, TraceSession};
pub use result::TraceReport;
pub use traits::TracerouteDriver;
pub use types::{
    HopResult, HopStatus, ProbeResponse, ResponseKind, Termination, TracerouteConfig,
    TracerouteParams,
};
