//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{IdentityConfig, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_BIND_ADDRESS: &str = "EDGE_BIND_ADDRESS";
pub const ENV_TOKEN_ENDPOINT: &str = "EDGE_IDENTITY_TOKEN_ENDPOINT";
pub const ENV_CLIENT_ID: &str = "EDGE_IDENTITY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "EDGE_IDENTITY_CLIENT_SECRET";

/// Error type for configuration loading. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file and apply environment overrides.
///
/// Not validated: callers apply their own overrides first and validate once
/// (`HttpServer::new` refuses an invalid config).
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse and apply environment overrides.
///
/// `env` is injected so overrides can be exercised without touching the
/// process environment.
pub fn parse_config<F>(content: &str, env: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: ProxyConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, env);
    Ok(config)
}

/// Check a fully overridden config.
pub fn validate(config: &ProxyConfig) -> Result<(), ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)
}

/// Secrets and the bind address may come from the environment instead of the file.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = env(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }

    let endpoint = env(ENV_TOKEN_ENDPOINT);
    let client_id = env(ENV_CLIENT_ID);
    let client_secret = env(ENV_CLIENT_SECRET);

    // Any identity variable creates the section, so a partial set is
    // reported by validation instead of being dropped.
    let any_identity = endpoint.is_some() || client_id.is_some() || client_secret.is_some();
    if config.identity.is_none() && any_identity {
        config.identity = Some(IdentityConfig {
            token_endpoint: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_margin_secs: 60,
        });
    }

    if let Some(identity) = config.identity.as_mut() {
        if let Some(endpoint) = endpoint {
            identity.token_endpoint = endpoint;
        }
        if let Some(id) = client_id {
            identity.client_id = id;
        }
        if let Some(secret) = client_secret {
            identity.client_secret = secret;
        }
    }
}
