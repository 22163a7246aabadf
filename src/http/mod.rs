//! HTTP edge subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → middleware/edge.rs (route lookup, OPTIONS, method allow-list, CORS)
//!     → handler.rs (token resolution per auth mode)
//!     → forward.rs (outbound request, one attempt, deadline)
//!     → response.rs (JSON decode or text passthrough, status preserved)
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::{EdgeError, ErrorBody, TransportError, TranslationError};
pub use forward::Forwarder;
pub use handler::EdgeHandler;
pub use request::{EdgeRequestId, InboundRequest, X_REQUEST_ID};
pub use response::{OutboundResult, ResponseBody};
pub use server::{AppState, HttpServer};
