//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (longest-mount lookup)
//!     → matcher.rs (segment-aware prefix match, yields path suffix)
//!     → Return: EdgeRoute + suffix, or no match
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → target.rs (parse methods, CORS header values, ProxyTarget)
//!     → Sort by mount length
//!     → Freeze as immutable RouteTable
//! ```

pub mod matcher;
pub mod router;
pub mod target;

pub use router::{RouteMatch, RouteTable};
pub use target::{EdgeRoute, ProxyTarget};
