//! Response relay and error mapping.
//!
//! # Responsibilities
//! - Relay the upstream status, headers and body to the client
//! - Map pipeline failures to HTTP status codes
//!
//! # Design Decisions
//! - Relay is verbatim by default, hop-by-hop headers included
//! - The body is relayed buffered, so upstream framing (`Transfer-Encoding`,
//!   `Content-Length`) is always replaced by the length of the buffered body
//! - Hop-by-hop stripping is opt-in (`upstream.strip_hop_by_hop`)
//! - Undecodable bodies are a server error (500), never forwarded
//! - Upstream timeouts result in 504, other upstream failures in 502

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::forward::{UpstreamError, UpstreamResponse};
use crate::routing::DecodeError;

/// Why a request could not be proxied.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(UpstreamError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(UpstreamError::InvalidUri { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Headers that only make sense for a single connection.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Turn a buffered upstream response into the client response.
///
/// The upstream framing headers describe a body that has already been
/// decoded; the server sets `Content-Length` from the buffered bytes instead.
pub fn relay(upstream: UpstreamResponse, strip: bool) -> Response {
    let UpstreamResponse { status, mut headers, body } = upstream;
    if strip {
        strip_hop_by_hop(&mut headers);
    }
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONTENT_LENGTH);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
