//! Request-scoped errors and their JSON rendering.
//!
//! Every failure exit of the edge renders as `{"error": .., "message"?: ..}`.

use std::time::Duration;

use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Uniform error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Failure contacting the backend.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid outbound request: {0}")]
    InvalidRequest(String),

    #[error("backend unreachable: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("failed to read backend response body: {0}")]
    Body(String),
}

impl TransportError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::InvalidRequest(_) => "invalid_request",
            TransportError::Connect(_) => "connect",
            TransportError::Timeout(_) => "timeout",
            TransportError::Body(_) => "body",
        }
    }
}

/// Backend declared JSON but sent something else.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("backend declared JSON but the body did not parse: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Everything that can end a request early.
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("no route for {0}")]
    NoRoute(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("request body too large: {0}")]
    RequestTooLarge(String),

    #[error("request body unreadable: {0}")]
    RequestBody(String),

    #[error("backend credentials unavailable")]
    CredentialsUnavailable,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Translation(#[from] TranslationError),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::NoRoute(_) => StatusCode::NOT_FOUND,
            EdgeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            EdgeError::RequestTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            EdgeError::RequestBody(_) => StatusCode::BAD_REQUEST,
            EdgeError::CredentialsUnavailable => StatusCode::BAD_GATEWAY,
            EdgeError::Transport(_) | EdgeError::Translation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, message) = match self {
            EdgeError::NoRoute(_) => ("Not found", Some(self.to_string())),
            EdgeError::MethodNotAllowed => ("Method not allowed", None),
            EdgeError::RequestTooLarge(_) => ("Request body too large", Some(self.to_string())),
            EdgeError::RequestBody(_) => ("Invalid request body", Some(self.to_string())),
            EdgeError::CredentialsUnavailable => ("Upstream authentication unavailable", None),
            EdgeError::Transport(e) => ("Proxy request failed", Some(e.to_string())),
            EdgeError::Translation(e) => ("Invalid backend response", Some(e.to_string())),
        };
        ErrorBody {
            error: error.to_string(),
            message,
        }
    }
}

impl From<BytesRejection> for EdgeError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection {
            BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(e)) => {
                EdgeError::RequestTooLarge(e.body_text())
            }
            other => EdgeError::RequestBody(other.body_text()),
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
