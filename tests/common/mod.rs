//! Shared utilities for integration testing.
//!
//! Every mock binds `127.0.0.1:0`, so tests never fight over ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use storefront_edge::config::{
    AuthMode, IdentityConfig, MissingTokenPolicy, ProxyConfig, RouteConfig,
};
use storefront_edge::{HttpServer, Shutdown};

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: &'static str,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// A backend that records every request and always answers the same way.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> Recorded {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend was never called")
    }
}

async fn record(State(state): State<BackendState>, request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    state.requests.lock().unwrap().push(Recorded {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    });

    let mut builder = Response::builder().status(state.status);
    if let Some(content_type) = state.content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(state.body)).unwrap()
}

/// Start a recording backend with a fixed answer.
pub async fn start_backend(
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
) -> MockBackend {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        status: StatusCode::from_u16(status).unwrap(),
        content_type,
        body,
        requests: requests.clone(),
    };

    let app = Router::new().fallback(record).with_state(state);
    let addr = serve(app).await;
    MockBackend { addr, requests }
}

/// JSON backend answering `200 {"ok":true}`.
pub async fn start_json_backend() -> MockBackend {
    start_backend(200, Some("application/json"), r#"{"ok":true}"#).await
}

/// A backend that answers `200 {}` only after `delay`.
pub async fn start_slow_backend(delay: std::time::Duration) -> SocketAddr {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        Response::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap()
    });
    serve(app).await
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[derive(Clone)]
struct IdpState {
    calls: Arc<AtomicUsize>,
    healthy: Arc<AtomicBool>,
    forms: Arc<Mutex<Vec<String>>>,
}

/// Mock OAuth2 token endpoint.
#[derive(Clone)]
pub struct MockIdp {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    healthy: Arc<AtomicBool>,
    forms: Arc<Mutex<Vec<String>>>,
}

impl MockIdp {
    pub fn token_endpoint(&self) -> String {
        format!("http://{}/oauth/token", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn last_form(&self) -> String {
        self.forms.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn identity(&self) -> IdentityConfig {
        IdentityConfig {
            token_endpoint: self.token_endpoint(),
            client_id: "storefront-edge".to_string(),
            client_secret: "s3cret".to_string(),
            refresh_margin_secs: 60,
        }
    }
}

async fn issue_token(State(state): State<IdpState>, body: String) -> Response<Body> {
    let n = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    state.forms.lock().unwrap().push(body);

    if !state.healthy.load(Ordering::SeqCst) {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from("identity provider down"))
            .unwrap();
    }

    let payload = format!(
        r#"{{"access_token":"svc-token-{}","expires_in":3600,"token_type":"Bearer"}}"#,
        n
    );
    Response::builder()
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap()
}

/// Start a mock identity provider. Tokens are `svc-token-<n>` for the n-th call.
pub async fn start_idp(healthy: bool) -> MockIdp {
    let calls = Arc::new(AtomicUsize::new(0));
    let healthy = Arc::new(AtomicBool::new(healthy));
    let forms = Arc::new(Mutex::new(Vec::new()));

    let state = IdpState {
        calls: calls.clone(),
        healthy: healthy.clone(),
        forms: forms.clone(),
    };
    let app = Router::new()
        .route("/oauth/token", post(issue_token))
        .with_state(state);
    let addr = serve(app).await;

    MockIdp {
        addr,
        calls,
        healthy,
        forms,
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Route forwarding `mount` to `base_url`.
pub fn route(
    name: &str,
    mount: &str,
    base_url: &str,
    target_prefix: &str,
    auth: AuthMode,
    methods: Option<&[&str]>,
) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        mount: mount.to_string(),
        base_url: base_url.to_string(),
        target_prefix: target_prefix.to_string(),
        auth,
        methods: methods.map(|m| m.iter().map(|s| s.to_string()).collect()),
        allowed_headers: "Content-Type, Authorization".to_string(),
        missing_token: MissingTokenPolicy::ForwardAnonymous,
    }
}

/// Config with short timeouts and the given routes.
pub fn config(routes: Vec<RouteConfig>, identity: Option<IdentityConfig>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.connect_secs = 2;
    config.timeouts.request_secs = 5;
    config.identity = identity;
    config.routes = routes;
    config
}

/// A running edge on an ephemeral port.
pub struct EdgeHandle {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl EdgeHandle {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Build and start the edge.
pub async fn start_edge(config: ProxyConfig) -> EdgeHandle {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx: broadcast::Receiver<()> = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    EdgeHandle {
        addr,
        client: reqwest::Client::new(),
        shutdown,
    }
}
