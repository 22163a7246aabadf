//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the edge middleware and proxy handler
//! - Build the shared services (route table, token cache, forwarder)
//! - Wire up tower layers (request ID, tracing)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::loader::validate;
use crate::config::{ConfigError, ProxyConfig};
use crate::credentials::{ClientCredentialsFetcher, TokenCache};
use crate::http::forward::Forwarder;
use crate::http::handler::{proxy_handler, EdgeHandler};
use crate::http::middleware::edge_middleware;
use crate::http::request::{request_id, EdgeRequestId};
use crate::resilience::OutboundTimeouts;
use crate::routing::RouteTable;

/// Application state injected into the middleware and handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub handler: Arc<EdgeHandler>,
}

/// HTTP server for the storefront edge.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    tokens: Option<Arc<TokenCache>>,
}

impl HttpServer {
    /// Create a new HTTP server. Refuses any configuration that fails validation.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate(&config)?;

        let routes = RouteTable::from_config(&config.effective_routes())
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        let timeouts = OutboundTimeouts::from_config(&config.timeouts);

        // One token cache for the whole process, shared by every route.
        let tokens = match &config.identity {
            Some(identity) => {
                let fetcher = ClientCredentialsFetcher::new(identity, timeouts)?;
                Some(Arc::new(TokenCache::with_margin(
                    fetcher,
                    Duration::from_secs(identity.refresh_margin_secs),
                )))
            }
            None => None,
        };

        let forwarder = Forwarder::new(timeouts, config.limits.max_response_body_bytes);

        tracing::info!(
            routes = routes.len(),
            identity = tokens.is_some(),
            connect_timeout_secs = config.timeouts.connect_secs,
            request_timeout_secs = config.timeouts.request_secs,
            "Edge initialised"
        );

        let state = AppState {
            routes: Arc::new(routes),
            handler: Arc::new(EdgeHandler::new(tokens.clone(), forwarder)),
        };

        Ok(Self {
            router: Self::build_router(state, config.limits.max_request_body_bytes),
            config: Arc::new(config),
            tokens,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, max_request_bytes: usize) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .layer(DefaultBodyLimit::max(max_request_bytes))
            .layer(middleware::from_fn_with_state(state.clone(), edge_middleware))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(EdgeRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                path = %request.uri().path(),
                                request_id = %request_id(request.headers()),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The shared token cache, if an identity provider is configured.
    pub fn token_cache(&self) -> Option<&Arc<TokenCache>> {
        self.tokens.as_ref()
    }
}
