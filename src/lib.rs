//! Storefront edge: credential-caching reverse proxy for the storefront and
//! admin backends.

pub mod config;
pub mod credentials;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use credentials::TokenCache;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
