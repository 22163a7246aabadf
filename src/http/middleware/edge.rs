//! Route resolution, preflight, method allow-list and CORS.
//!
//! Runs in front of the proxy handler for every request, so each route
//! family gets identical CORS and method semantics from its declarative
//! fields instead of re-deriving them per handler.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::EdgeError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::EdgeRoute;

/// Route chosen for a request, attached as a request extension.
#[derive(Clone, Debug)]
pub struct MatchedRoute {
    pub route: Arc<EdgeRoute>,
    pub suffix: String,
}

/// Set CORS headers. Without a route only the origin is declared.
pub fn apply_cors(headers: &mut HeaderMap, route: Option<&EdgeRoute>) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    if let Some(route) = route {
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, route.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, route.allow_headers.clone());
    }
}

pub async fn edge_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // 1. Resolve the route family
    let lookup = state.routes.match_path(&path).map(|m| MatchedRoute {
        route: m.route,
        suffix: m.suffix.to_string(),
    });
    let matched = match lookup {
        Some(matched) => matched,
        None => {
            let mut response = EdgeError::NoRoute(path).into_response();
            apply_cors(response.headers_mut(), None);
            metrics::record_request("none", method.as_str(), response.status().as_u16(), start);
            return response;
        }
    };
    let route = matched.route.clone();

    let mut response = if method == Method::OPTIONS {
        // 2. Preflight never reaches a backend
        StatusCode::OK.into_response()
    } else if !route.allows(&method) {
        // 3. Method allow-list
        EdgeError::MethodNotAllowed.into_response()
    } else {
        req.extensions_mut().insert(matched);
        next.run(req).await
    };

    apply_cors(response.headers_mut(), Some(&route));
    metrics::record_request(&route.name, method.as_str(), response.status().as_u16(), start);
    response
}
