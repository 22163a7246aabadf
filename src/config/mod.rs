//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + EDGE_* environment
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route targets never change at runtime
//! - All fields have defaults to allow minimal configs
//! - No `[[routes]]` means the built-in storefront table (routes.rs)
//! - Any validation error is fatal: the edge never proxies to an undefined target

pub mod loader;
pub mod routes;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthMode, IdentityConfig, ListenerConfig, LogFormat, MissingTokenPolicy,
    ObservabilityConfig, ProxyConfig, RouteConfig,
};
pub use validation::ValidationError;
