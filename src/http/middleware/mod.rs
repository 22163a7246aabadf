//! Middleware shared by every route family.

pub mod edge;

pub use edge::{apply_cors, edge_middleware, MatchedRoute};
