//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::routes::storefront_routes;

/// Root configuration for the storefront edge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound timeouts shared by the token fetcher and the forwarder.
    pub timeouts: TimeoutConfig,

    /// Identity provider used to mint service tokens.
    /// Required as soon as one route uses `cached_bearer_token`.
    pub identity: Option<IdentityConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Route families. Empty means the built-in storefront table.
    pub routes: Vec<RouteConfig>,
}

impl ProxyConfig {
    /// Routes actually served: the configured ones, or the storefront table.
    pub fn effective_routes(&self) -> Vec<RouteConfig> {
        if self.routes.is_empty() {
            storefront_routes()
        } else {
            self.routes.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one outbound request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// OAuth2 client-credentials settings.
#[derive(Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Token endpoint URL.
    pub token_endpoint: String,

    pub client_id: String,

    pub client_secret: String,

    /// Seconds before expiry at which a cached token stops being reused.
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_secs: u64,
}

fn default_refresh_margin() -> u64 {
    60
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_margin_secs", &self.refresh_margin_secs)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Body size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body in bytes.
    pub max_request_body_bytes: usize,

    /// Maximum backend response body in bytes.
    pub max_response_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 2 * 1024 * 1024, // 2MB
            max_response_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// How a route authenticates against its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No `Authorization` header is sent.
    None,
    /// A service token from the shared token cache.
    CachedBearerToken,
    /// The caller's own `Authorization` header, verbatim.
    ForwardCallerAuth,
}

/// What a `cached_bearer_token` route does when no token can be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingTokenPolicy {
    #[default]
    ForwardAnonymous,
    Reject,
}

/// One route family.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Inbound path prefix this route owns (e.g. "/api/banks").
    pub mount: String,

    /// Backend base URL, plain HTTP (e.g. "http://banks-service:8080").
    pub base_url: String,

    /// Prefix prepended to the remainder of the inbound path.
    #[serde(default)]
    pub target_prefix: String,

    pub auth: AuthMode,

    /// Method allow-list. `None` accepts every method.
    #[serde(default)]
    pub methods: Option<Vec<String>>,

    /// Value of `Access-Control-Allow-Headers`.
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: String,

    #[serde(default)]
    pub missing_token: MissingTokenPolicy,
}

pub(crate) fn default_allowed_headers() -> String {
    "Content-Type, Authorization".to_string()
}
