//! Service credentials subsystem.
//!
//! # Data Flow
//! ```text
//! Edge handler (route needs a service token)
//!     → cache.rs (fresh cached token? return it, no I/O)
//!     → fetcher.rs (client-credentials grant against the identity provider)
//!     → cache.rs (store CachedToken, expires_at = fetch time + expires_in)
//!     → token or None back to the handler
//! ```
//!
//! # Design Decisions
//! - One cache instance per process, injected into the application state
//! - Tokens stop being reused 60s before expiry
//! - Failures never escape as errors from `acquire()`; absence of a token is
//!   a handled outcome decided by route policy
//! - No retries anywhere in this subsystem

pub mod cache;
pub mod fetcher;
pub mod types;

pub use cache::TokenCache;
pub use fetcher::{fetch_token, ClientCredentialsFetcher, CredentialFetcher};
pub use types::{CachedToken, CredentialError, IssuedToken};
