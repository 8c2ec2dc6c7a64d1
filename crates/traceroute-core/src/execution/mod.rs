//! Execution strategy for traceroute.
//!
//! Probing is strictly serial: one attempt in flight at a time.

pub mod serial;

pub use serial::{traceroute_serial, TraceSession};
