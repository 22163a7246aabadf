//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Capture a read-only view of what the edge received
//!
//! # Design Decisions
//! - The request ID is logged and echoed to the caller, never sent to backends
//! - The inbound request is never mutated, only projected outbound

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeRequestId;

impl MakeRequestId for EdgeRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of an inbound request, or "unknown".
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Read-only view of an inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub full_path: String,
    /// Part of the path after the route's mount.
    pub suffix: String,
    /// Raw query string, without '?'.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        suffix: impl Into<String>,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            full_path: uri.path().to_string(),
            suffix: suffix.into(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        }
    }
}
