//! Route lookup.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest mount wins, so "/api/accounts/register" beats "/api/accounts"
//! - Explicit no-match rather than a silent default

use std::sync::Arc;

use crate::config::schema::RouteConfig;
use crate::config::validation::ValidationError;
use crate::routing::target::EdgeRoute;

/// A matched route plus the part of the path after its mount.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: Arc<EdgeRoute>,
    pub suffix: &'a str,
}

/// Compiled, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<EdgeRoute>>,
}

impl RouteTable {
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, ValidationError> {
        let mut routes = configs
            .iter()
            .map(|config| EdgeRoute::from_config(config).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        routes.sort_by(|a, b| b.mount().len().cmp(&a.mount().len()));

        for route in &routes {
            tracing::debug!(
                route = %route.name,
                mount = %route.mount(),
                target = %route.target.url_for("", None),
                auth = ?route.target.auth_mode,
                "Route compiled"
            );
        }

        Ok(Self { routes })
    }

    pub fn match_path<'a>(&self, path: &'a str) -> Option<RouteMatch<'a>> {
        self.routes.iter().find_map(|route| {
            route.matcher.strip(path).map(|suffix| RouteMatch {
                route: route.clone(),
                suffix,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
