//! Inbound request identification.
//!
//! # Design Decisions
//! - Reuse the caller's `x-request-id` when it sent one
//! - The id only tags log spans; it is never added to forwarded headers

use axum::http::HeaderMap;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id for log correlation.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
