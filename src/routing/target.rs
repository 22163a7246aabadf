//! Compiled route families and their backend targets.

use axum::http::{HeaderValue, Method};

use crate::config::schema::{AuthMode, MissingTokenPolicy, RouteConfig};
use crate::config::validation::{parse_method, ValidationError};
use crate::routing::matcher::MountMatcher;

const ALL_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// Where a route family forwards to, and how it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Scheme and authority, without trailing slash.
    pub base_url: String,
    pub path_prefix: String,
    pub auth_mode: AuthMode,
}

impl ProxyTarget {
    pub fn new(base_url: &str, path_prefix: &str, auth_mode: AuthMode) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            path_prefix: path_prefix.to_string(),
            auth_mode,
        }
    }

    /// `base_url + path_prefix + suffix`, with the query string appended verbatim.
    pub fn url_for(&self, suffix: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}{}", self.base_url, self.path_prefix, suffix);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// A route family: mount, method allow-list, CORS values, and target.
#[derive(Debug, Clone)]
pub struct EdgeRoute {
    pub name: String,
    pub matcher: MountMatcher,
    /// `None` accepts every method.
    pub methods: Option<Vec<Method>>,
    pub allow_methods: HeaderValue,
    pub allow_headers: HeaderValue,
    pub missing_token: MissingTokenPolicy,
    pub target: ProxyTarget,
}

impl EdgeRoute {
    /// Compile a validated route config.
    pub fn from_config(config: &RouteConfig) -> Result<Self, ValidationError> {
        let route_error = |reason: String| ValidationError::Route {
            route: config.name.clone(),
            reason,
        };

        let methods = match &config.methods {
            Some(names) => {
                let mut methods = Vec::with_capacity(names.len());
                for name in names {
                    let method = parse_method(name)
                        .ok_or_else(|| route_error(format!("unknown method '{}'", name)))?;
                    if !methods.contains(&method) {
                        methods.push(method);
                    }
                }
                Some(methods)
            }
            None => None,
        };

        let allow_methods = match &methods {
            Some(methods) => {
                let mut names: Vec<&str> = methods.iter().map(Method::as_str).collect();
                if !methods.contains(&Method::OPTIONS) {
                    names.push("OPTIONS");
                }
                HeaderValue::from_str(&names.join(", "))
                    .map_err(|e| route_error(e.to_string()))?
            }
            None => HeaderValue::from_static(ALL_METHODS),
        };

        let allow_headers = HeaderValue::from_str(&config.allowed_headers)
            .map_err(|e| route_error(e.to_string()))?;

        Ok(Self {
            name: config.name.clone(),
            matcher: MountMatcher::new(config.mount.clone()),
            methods,
            allow_methods,
            allow_headers,
            missing_token: config.missing_token,
            target: ProxyTarget::new(&config.base_url, &config.target_prefix, config.auth),
        })
    }

    pub fn mount(&self) -> &str {
        self.matcher.mount()
    }

    /// Whether the allow-list (if any) admits `method`.
    pub fn allows(&self, method: &Method) -> bool {
        self.methods
            .as_ref()
            .map(|methods| methods.contains(method))
            .unwrap_or(true)
    }
}
