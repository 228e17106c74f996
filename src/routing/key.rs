//! Routing key extraction.
//!
//! # Design Decisions
//! - The key is the raw header value bytes; no trimming or case folding
//! - First occurrence wins when the header is repeated
//! - An empty value counts as absent

use std::fmt;

use axum::http::{HeaderMap, HeaderName};

/// A routing key borrowed from the inbound request headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingKey<'a>(&'a [u8]);

impl<'a> RoutingKey<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }
}

impl fmt::Display for RoutingKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0))
    }
}

/// Return the routing key carried by `header`, if any.
pub fn extract_routing_key<'a>(headers: &'a HeaderMap, header: &HeaderName) -> Option<RoutingKey<'a>> {
    headers
        .get(header)
        .map(|value| value.as_bytes())
        .filter(|bytes| !bytes.is_empty())
        .map(RoutingKey)
}
