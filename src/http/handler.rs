//! Per-route orchestration.
//!
//! # States
//! ```text
//! Start → PreflightCheck → MethodCheck        (middleware/edge.rs)
//!       → TokenResolution → Forwarding → Translating → Done   (here)
//! Any step → Failed → structured JSON error
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};

use crate::config::{AuthMode, MissingTokenPolicy};
use crate::credentials::TokenCache;
use crate::http::error::EdgeError;
use crate::http::forward::Forwarder;
use crate::http::middleware::MatchedRoute;
use crate::http::request::{request_id, InboundRequest};
use crate::http::response::{translate, OutboundResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::EdgeRoute;

/// Token resolution, forwarding and translation for any route.
#[derive(Debug, Clone)]
pub struct EdgeHandler {
    tokens: Option<Arc<TokenCache>>,
    forwarder: Forwarder,
}

impl EdgeHandler {
    pub fn new(tokens: Option<Arc<TokenCache>>, forwarder: Forwarder) -> Self {
        Self { tokens, forwarder }
    }

    /// Run one inbound request against `route`. Exactly one forwarding attempt.
    pub async fn handle(
        &self,
        route: &EdgeRoute,
        inbound: &InboundRequest,
    ) -> Result<OutboundResult, EdgeError> {
        let token = self.resolve_token(route).await?;

        let raw = self
            .forwarder
            .forward(&route.target, inbound, token.as_deref())
            .await
            .inspect_err(|e| metrics::record_upstream_error(&route.name, e.kind()))?;

        let result = translate(raw)
            .inspect_err(|_| metrics::record_upstream_error(&route.name, "translation"))?;
        Ok(result)
    }

    async fn resolve_token(&self, route: &EdgeRoute) -> Result<Option<String>, EdgeError> {
        if route.target.auth_mode != AuthMode::CachedBearerToken {
            return Ok(None);
        }

        let token = match &self.tokens {
            Some(cache) => cache.acquire().await,
            None => None,
        };

        if token.is_none() {
            match route.missing_token {
                MissingTokenPolicy::Reject => return Err(EdgeError::CredentialsUnavailable),
                MissingTokenPolicy::ForwardAnonymous => {
                    tracing::warn!(route = %route.name, "No service token, forwarding anonymously");
                }
            }
        }

        Ok(token)
    }
}

/// Axum entry point behind the edge middleware.
///
/// The body is buffered by the `Bytes` extractor under the router's
/// `DefaultBodyLimit`; its rejection tells an oversized body from a broken one.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Extension(matched): Extension<MatchedRoute>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::debug!(request_id = %request_id, route = %matched.route.name, "Request body rejected");
            return EdgeError::from(rejection).into_response();
        }
    };

    let inbound = InboundRequest::new(method, &uri, headers, matched.suffix.clone(), body);

    tracing::debug!(
        request_id = %request_id,
        route = %matched.route.name,
        method = %inbound.method,
        path = %inbound.full_path,
        "Proxying request"
    );

    match state.handler.handle(&matched.route, &inbound).await {
        Ok(result) => result.into_response(),
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                route = %matched.route.name,
                error = %e,
                "Edge request failed"
            );
            e.into_response()
        }
    }
}
