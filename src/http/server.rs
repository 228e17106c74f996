//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (tracing, body limit)
//! - Bind server to listener with graceful shutdown
//! - Run each request through routing, forwarding and relay

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::{RouterConfig, ValidationError};
use crate::http::forward::Forwarder;
use crate::http::request::request_id;
use crate::http::response::{relay, ProxyError};
use crate::observability::metrics;
use crate::routing::RankRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RankRouter>,
    pub forwarder: Forwarder,
    pub strip_hop_by_hop: bool,
}

/// HTTP server for the rank router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The configuration is expected to be validated; the routing section is
    /// checked again here because the rank router cannot exist without it.
    pub fn new(config: RouterConfig) -> Result<Self, ValidationError> {
        let state = AppState {
            router: Arc::new(RankRouter::from_config(&config.routing)?),
            forwarder: Forwarder::from_config(&config.upstream),
            strip_hop_by_hop: config.upstream.strip_hop_by_hop,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        let methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE);

        Router::new()
            .route("/{*path}", on(methods, proxy_handler))
            .route("/", on(methods, proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// The Axum router, for serving on a custom listener or in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.upstream.backend,
            dp_size = self.config.routing.dp_size,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Routes the body, forwards it upstream and relays the response.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let method_str = method.to_string();
    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id(&headers),
        method = %method,
        path = %uri.path(),
    );

    let response = match proxy(&state, method, &uri, &headers, body).instrument(span.clone()).await {
        Ok(response) => response,
        Err(e) => {
            span.in_scope(|| match &e {
                ProxyError::Decode(err) => {
                    tracing::warn!(error = %err, "Rejecting request with undecodable body");
                }
                ProxyError::Upstream(err) => {
                    tracing::error!(error = %err, kind = err.kind(), "Upstream error");
                    metrics::record_upstream_error(err.kind());
                }
            });
            e.into_response()
        }
    };

    metrics::record_request(&method_str, response.status().as_u16(), start_time);
    response
}

/// Extractor → selector → rewriter → forwarder → relay.
async fn proxy(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let routed = state.router.route(&method, headers, body)?;

    tracing::debug!(rank = ?routed.rank, bytes = routed.body.len(), "Forwarding request");

    let request = state.forwarder.build_request(method, uri, headers, routed.body)?;
    let upstream = state.forwarder.forward(request).await?;

    tracing::debug!(status = %upstream.status, bytes = upstream.body.len(), "Upstream responded");

    Ok(relay(upstream, state.strip_hop_by_hop))
}
