//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, method filter, body limit)
//!     → request.rs (request ID for the log span)
//!     → [routing layer injects the rank] (crate::routing)
//!     → forward.rs (pooled upstream call with deadline)
//!     → response.rs (verbatim relay, error → status)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, UpstreamError, UpstreamResponse};
pub use request::{request_id, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
