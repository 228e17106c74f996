//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request (backend URL + original path and query)
//! - Drop `Host` and `Content-Length`; the client recomputes both
//! - Send through the shared connection pool under one deadline
//! - Buffer the full upstream response for relay
//!
//! # Design Decisions
//! - One pooled client per process, cloned into every request
//! - The deadline covers send, response head and response body
//! - No retries; failures are returned as [`UpstreamError`]
//! - Dropping the forward future drops the in-flight exchange, and the
//!   client closes that upstream connection

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use thiserror::Error;

use crate::config::UpstreamConfig;

/// A failed upstream exchange.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read upstream response body: {0}")]
    Body(#[source] axum::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl UpstreamError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::InvalidUri { .. } => "invalid_uri",
            UpstreamError::Request(_) => "request",
            UpstreamError::Body(_) => "body",
            UpstreamError::Timeout(_) => "timeout",
        }
    }
}

/// A fully buffered upstream response.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Sends requests to the configured backend.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    base: String,
    timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder with its own connection pool.
    ///
    /// Expects a validated config.
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(connector);

        Self {
            client,
            base: config.backend.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Backend base URL without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Backend URI for an inbound request URI, keeping path and query.
    pub fn outbound_uri(&self, inbound: &Uri) -> Result<Uri, UpstreamError> {
        let path = inbound.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let uri = format!("{}{}", self.base, path);
        uri.parse().map_err(|source| UpstreamError::InvalidUri { uri, source })
    }

    /// Assemble the outbound request.
    pub fn build_request(
        &self,
        method: Method,
        inbound: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Request<Body>, UpstreamError> {
        let mut request = Request::new(Body::from(body));
        *request.method_mut() = method;
        *request.uri_mut() = self.outbound_uri(inbound)?;
        *request.headers_mut() = filter_request_headers(headers);
        Ok(request)
    }

    /// Send a request and buffer the response.
    pub async fn forward(&self, request: Request<Body>) -> Result<UpstreamResponse, UpstreamError> {
        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(UpstreamError::Body)?;
            Ok::<_, UpstreamError>(UpstreamResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))?
    }
}

/// Inbound headers minus `Host` and `Content-Length`.
///
/// Repeated headers keep every value, in order.
pub fn filter_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}
