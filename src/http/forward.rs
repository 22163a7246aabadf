//! Request forwarding to backends.
//!
//! # Responsibilities
//! - Build the outbound URL: base URL + target prefix + inbound suffix + query
//! - Copy the method; copy the body only for POST/PUT/PATCH
//! - Apply the header policy: JSON content type plus the route's auth mode
//! - Send once under the configured deadline and buffer the response
//!
//! # Design Decisions
//! - No inbound header other than `Authorization` (and only for
//!   `forward_caller_auth`) ever reaches a backend
//! - Dropping the returned future aborts the call; the pooled client
//!   discards the connection, so nothing leaks on client disconnect

use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::AuthMode;
use crate::http::error::TransportError;
use crate::http::request::InboundRequest;
use crate::resilience::OutboundTimeouts;
use crate::routing::ProxyTarget;

/// Methods whose body is forwarded.
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Build the outbound request for `target`.
pub fn build_request(
    target: &ProxyTarget,
    inbound: &InboundRequest,
    token: Option<&str>,
) -> Result<Request<Body>, TransportError> {
    let url = target.url_for(&inbound.suffix, inbound.query.as_deref());
    let uri: Uri = url
        .parse()
        .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", url, e)))?;

    let mut builder = Request::builder()
        .method(inbound.method.clone())
        .uri(uri)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    match target.auth_mode {
        AuthMode::CachedBearerToken => {
            if let Some(token) = token {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| TransportError::InvalidRequest("malformed service token".into()))?;
                builder = builder.header(AUTHORIZATION, value);
            }
        }
        AuthMode::ForwardCallerAuth => {
            if let Some(value) = inbound.headers.get(AUTHORIZATION) {
                builder = builder.header(AUTHORIZATION, value.clone());
            }
        }
        AuthMode::None => {}
    }

    let body = if carries_body(&inbound.method) {
        Body::from(inbound.body.clone())
    } else {
        Body::empty()
    };

    builder
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

/// Sends outbound requests over a pooled plain-HTTP client.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeouts: OutboundTimeouts,
    max_response_bytes: usize,
}

impl Forwarder {
    pub fn new(timeouts: OutboundTimeouts, max_response_bytes: usize) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeouts,
            max_response_bytes,
        }
    }

    /// Issue exactly one request and buffer the backend response.
    pub async fn forward(
        &self,
        target: &ProxyTarget,
        inbound: &InboundRequest,
        token: Option<&str>,
    ) -> Result<Response<Bytes>, TransportError> {
        let request = build_request(target, inbound, token)?;

        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            auth = ?target.auth_mode,
            "Forwarding request"
        );

        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let bytes = axum::body::to_bytes(Body::new(body), self.max_response_bytes)
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;
            Ok::<_, TransportError>(Response::from_parts(parts, bytes))
        };

        match self.timeouts.bounded(exchange).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeouts.request)),
        }
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("timeouts", &self.timeouts)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn inbound(method: Method, body: &'static str) -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer caller-token"));
        headers.insert("cookie", HeaderValue::from_static("session=abc"));
        headers.insert("host", HeaderValue::from_static("shop.example.com"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        InboundRequest {
            method,
            full_path: "/api/banks/9".into(),
            suffix: "/9".into(),
            query: Some("expand=cards".into()),
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn target(auth_mode: AuthMode) -> ProxyTarget {
        ProxyTarget::new("http://banks-service:8080", "/api/v1/banks", auth_mode)
    }

    #[test]
    fn test_cached_token_mode_uses_service_token() {
        let req = build_request(
            &target(AuthMode::CachedBearerToken),
            &inbound(Method::POST, r#"{"a":1}"#),
            Some("svc-token"),
        )
        .unwrap();

        assert_eq!(*req.method(), Method::POST);
        assert_eq!(
            req.uri().to_string(),
            "http://banks-service:8080/api/v1/banks/9?expand=cards"
        );
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer svc-token");
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert!(req.headers().get("cookie").is_none());
        assert!(req.headers().get("host").is_none());
        assert_eq!(req.headers().len(), 2);
    }

    #[test]
    fn test_cached_token_mode_without_token_sends_no_auth() {
        let req = build_request(
            &target(AuthMode::CachedBearerToken),
            &inbound(Method::GET, ""),
            None,
        )
        .unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_forward_caller_auth_copies_header_verbatim() {
        let req = build_request(
            &target(AuthMode::ForwardCallerAuth),
            &inbound(Method::GET, ""),
            Some("ignored"),
        )
        .unwrap();
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer caller-token");
    }

    #[test]
    fn test_none_mode_strips_auth() {
        let req = build_request(
            &target(AuthMode::None),
            &inbound(Method::POST, "{}"),
            Some("ignored"),
        )
        .unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_body_only_for_mutating_methods() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::DELETE));
        assert!(!carries_body(&Method::OPTIONS));
    }

    #[tokio::test]
    async fn test_delete_drops_inbound_body() {
        let req = build_request(
            &target(AuthMode::None),
            &inbound(Method::DELETE, r#"{"should":"vanish"}"#),
            None,
        )
        .unwrap();
        let body = axum::body::to_bytes(req.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }
}
