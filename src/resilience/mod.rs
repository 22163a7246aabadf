//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (token endpoint or backend):
//!     → timeouts.rs (connect deadline on the connector, total deadline on the call)
//!     → on expiry: transport failure, surfaced once, never retried
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline taken from configuration
//! - No retries: each inbound request gets exactly one forwarding attempt

pub mod timeouts;

pub use timeouts::OutboundTimeouts;
