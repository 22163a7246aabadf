//! Backend response translation.
//!
//! # Responsibilities
//! - Decode JSON bodies when the backend declares `application/json`
//! - Pass every other body through untouched
//! - Re-emit with the backend's exact status code
//!
//! # Design Decisions
//! - An empty JSON body becomes `{}`; a non-empty undecodable one is an error
//! - Statuses are never remapped

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::http::error::TranslationError;

/// Body of a translated backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Opaque bytes, relayed unmodified.
    Text(Bytes),
}

/// What gets sent back to the caller.
#[derive(Debug, Clone)]
pub struct OutboundResult {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: ResponseBody,
}

fn is_json(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Turn a buffered backend response into an [`OutboundResult`].
pub fn translate(response: Response<Bytes>) -> Result<OutboundResult, TranslationError> {
    let (parts, bytes) = response.into_parts();
    let content_type = parts.headers.get(CONTENT_TYPE).cloned();

    let body = if is_json(content_type.as_ref()) {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            ResponseBody::Json(Value::Object(Default::default()))
        } else {
            ResponseBody::Json(serde_json::from_slice(&bytes)?)
        }
    } else {
        ResponseBody::Text(bytes)
    };

    Ok(OutboundResult {
        status: parts.status,
        content_type,
        body,
    })
}

impl IntoResponse for OutboundResult {
    fn into_response(self) -> axum::response::Response {
        match self.body {
            ResponseBody::Json(value) => (self.status, Json(value)).into_response(),
            ResponseBody::Text(bytes) => {
                let content_type = self
                    .content_type
                    .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
                let mut response = Response::new(Body::from(bytes));
                *response.status_mut() = self.status;
                response.headers_mut().insert(CONTENT_TYPE, content_type);
                response
            }
        }
    }
}
