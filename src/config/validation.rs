//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every route points at a well-formed plain-HTTP backend
//! - Check routes that mint service tokens have identity credentials
//! - Detect duplicate route names and mounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::{AuthMode, ProxyConfig, RouteConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("limit '{0}' must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("identity token endpoint '{0}' is not a valid http(s) URL")]
    TokenEndpoint(String),

    #[error("identity {0} is empty")]
    EmptyCredential(&'static str),

    #[error("route '{route}': base URL '{url}' is invalid: {reason}")]
    BaseUrl {
        route: String,
        url: String,
        reason: String,
    },

    #[error("route '{route}': {reason}")]
    Route { route: String, reason: String },

    #[error("route '{0}' uses cached_bearer_token but no [identity] section is configured")]
    MissingCredentials(String),

    #[error("duplicate route name '{0}'")]
    DuplicateName(String),

    #[error("duplicate route mount '{0}'")]
    DuplicateMount(String),
}

/// Parse a configured method name. Names are case-insensitive.
pub fn parse_method(name: &str) -> Option<Method> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).ok()
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.limits.max_request_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_request_body_bytes"));
    }
    if config.limits.max_response_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_response_body_bytes"));
    }

    if let Some(identity) = &config.identity {
        match Url::parse(&identity.token_endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => errors.push(ValidationError::TokenEndpoint(
                identity.token_endpoint.clone(),
            )),
        }
        if identity.client_id.trim().is_empty() {
            errors.push(ValidationError::EmptyCredential("client_id"));
        }
        if identity.client_secret.is_empty() {
            errors.push(ValidationError::EmptyCredential("client_secret"));
        }
    }

    let mut names = HashSet::new();
    let mut mounts = HashSet::new();
    for route in config.effective_routes() {
        if !names.insert(route.name.clone()) {
            errors.push(ValidationError::DuplicateName(route.name.clone()));
        }
        if !mounts.insert(route.mount.clone()) {
            errors.push(ValidationError::DuplicateMount(route.mount.clone()));
        }
        if route.auth == AuthMode::CachedBearerToken && config.identity.is_none() {
            errors.push(ValidationError::MissingCredentials(route.name.clone()));
        }
        validate_route(&route, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    let route_error = |reason: &str| ValidationError::Route {
        route: route.name.clone(),
        reason: reason.to_string(),
    };

    if route.name.trim().is_empty() {
        errors.push(route_error("name is empty"));
    }
    if !route.mount.starts_with('/') || (route.mount.len() > 1 && route.mount.ends_with('/')) {
        errors.push(route_error("mount must start with '/' and not end with '/'"));
    }
    if !route.target_prefix.is_empty() && !route.target_prefix.starts_with('/') {
        errors.push(route_error("target_prefix must be empty or start with '/'"));
    }
    if HeaderValue::from_str(&route.allowed_headers).is_err() {
        errors.push(route_error("allowed_headers is not a valid header value"));
    }

    if let Some(methods) = &route.methods {
        if methods.is_empty() {
            errors.push(route_error("methods allow-list is empty"));
        }
        for name in methods {
            if parse_method(name).is_none() {
                errors.push(route_error(&format!("unknown method '{}'", name)));
            }
        }
    }

    let base_url_error = |reason: &str| ValidationError::BaseUrl {
        route: route.name.clone(),
        url: route.base_url.clone(),
        reason: reason.to_string(),
    };
    match Url::parse(&route.base_url) {
        Ok(url) => {
            if url.scheme() != "http" {
                errors.push(base_url_error("backends are reached over plain http"));
            }
            if !url.has_host() {
                errors.push(base_url_error("missing host"));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(base_url_error("query and fragment are not allowed"));
            }
        }
        Err(e) => errors.push(base_url_error(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{IdentityConfig, MissingTokenPolicy};

    fn identity() -> IdentityConfig {
        IdentityConfig {
            token_endpoint: "http://identity.internal/oauth/token".into(),
            client_id: "storefront-edge".into(),
            client_secret: "s3cret".into(),
            refresh_margin_secs: 60,
        }
    }

    fn banks_route() -> RouteConfig {
        RouteConfig {
            name: "banks".into(),
            mount: "/api/banks".into(),
            base_url: "http://banks-service:8080".into(),
            target_prefix: "/api/v1/banks".into(),
            auth: AuthMode::CachedBearerToken,
            methods: Some(vec!["get".into(), "POST".into()]),
            allowed_headers: "Content-Type, Authorization".into(),
            missing_token: MissingTokenPolicy::ForwardAnonymous,
        }
    }

    #[test]
    fn test_default_table_with_identity_is_valid() {
        let config = ProxyConfig {
            identity: Some(identity()),
            ..ProxyConfig::default()
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_cached_token_route_requires_identity() {
        let config = ProxyConfig {
            routes: vec![banks_route()],
            ..ProxyConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingCredentials("banks".into())]);
    }

    #[test]
    fn test_rejects_https_and_garbage_base_urls() {
        let mut https = banks_route();
        https.base_url = "https://banks-service".into();
        let mut garbage = banks_route();
        garbage.name = "garbage".into();
        garbage.mount = "/api/garbage".into();
        garbage.base_url = "not a url".into();

        let config = ProxyConfig {
            identity: Some(identity()),
            routes: vec![https, garbage],
            ..ProxyConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::BaseUrl { .. })));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut bad = banks_route();
        bad.mount = "api/banks/".into();
        bad.methods = Some(vec!["FETCH ME".into()]);

        let mut config = ProxyConfig {
            identity: Some(IdentityConfig {
                client_secret: String::new(),
                ..identity()
            }),
            routes: vec![bad.clone(), bad],
            ..ProxyConfig::default()
        };
        config.timeouts.request_secs = 0;
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("nowhere".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout("request_secs")));
        assert!(errors.contains(&ValidationError::EmptyCredential("client_secret")));
        assert!(errors.contains(&ValidationError::DuplicateName("banks".into())));
        assert!(errors.contains(&ValidationError::DuplicateMount("api/banks/".into())));
    }

    #[test]
    fn test_parse_method_is_case_insensitive() {
        assert_eq!(parse_method("patch"), Some(Method::PATCH));
        assert_eq!(parse_method(" GET "), Some(Method::GET));
        assert_eq!(parse_method("NOT A METHOD"), None);
    }
}
