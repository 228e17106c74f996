//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, headers, body)
//!     → key.rs (routing key from the configured header)
//!     → rank.rs (sha256(key) mod dp_size)
//!     → rewrite.rs (inject data_parallel_rank into POST JSON bodies)
//!     → Return: body to forward, plus the rank if one was assigned
//! ```
//!
//! # Design Decisions
//! - Built once from validated config, immutable at runtime
//! - Deterministic: same key and dp_size always give the same rank
//! - No key means no decision; the backend balances those requests itself

pub mod key;
pub mod rank;
pub mod rewrite;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, Method};

use crate::config::{RoutingConfig, ValidationError};
use crate::observability::metrics;

pub use key::{extract_routing_key, RoutingKey};
pub use rank::{select_rank, PartitionCount};
pub use rewrite::{inject_rank, should_rewrite, DecodeError, RANK_FIELD};

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedBody {
    /// Body to forward upstream.
    pub body: Bytes,
    /// Rank injected into the body, if any.
    pub rank: Option<u64>,
}

/// Assigns requests to data parallel ranks.
#[derive(Debug, Clone)]
pub struct RankRouter {
    header: HeaderName,
    partitions: PartitionCount,
}

impl RankRouter {
    pub fn new(header: HeaderName, partitions: PartitionCount) -> Self {
        Self { header, partitions }
    }

    /// Build from the routing section of a config.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, ValidationError> {
        let header = HeaderName::from_bytes(config.header.as_bytes())
            .map_err(|_| ValidationError::InvalidHeader(config.header.clone()))?;
        let partitions = PartitionCount::new(config.dp_size).ok_or(ValidationError::ZeroPartitions)?;
        Ok(Self::new(header, partitions))
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    pub fn partitions(&self) -> PartitionCount {
        self.partitions
    }

    /// Decide the body to forward for a request.
    ///
    /// The body comes back unchanged unless a routing key is present and the
    /// request is a POST with a body, in which case the rank is injected.
    pub fn route(&self, method: &Method, headers: &HeaderMap, body: Bytes) -> Result<RoutedBody, DecodeError> {
        let key = match extract_routing_key(headers, &self.header) {
            Some(key) if should_rewrite(method, &body) => key,
            _ => return Ok(RoutedBody { body, rank: None }),
        };

        let rank = select_rank(key.as_bytes(), self.partitions);
        let body = inject_rank(&body, rank)?;

        tracing::info!(routing_key = %key, rank, "Routing key `{}` sent to DP rank `{}`", key, rank);
        metrics::record_rank_assignment(rank);

        Ok(RoutedBody { body, rank: Some(rank) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn router(dp_size: u64) -> RankRouter {
        RankRouter::from_config(&RoutingConfig {
            dp_size,
            header: "X-SMG-Routing-Key".into(),
        })
        .unwrap()
    }

    fn keyed(key: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-smg-routing-key", HeaderValue::from_static(key));
        headers
    }

    #[test]
    fn test_from_config_rejects_zero() {
        let err = RankRouter::from_config(&RoutingConfig { dp_size: 0, header: "X-Key".into() }).unwrap_err();
        assert_eq!(err, ValidationError::ZeroPartitions);
    }

    #[test]
    fn test_post_with_key_is_rewritten() {
        let routed = router(16)
            .route(&Method::POST, &keyed("abc"), Bytes::from_static(br#"{"prompt":"hi"}"#))
            .unwrap();
        assert_eq!(routed.rank, Some(13));
        assert_eq!(&routed.body[..], br#"{"prompt":"hi","data_parallel_rank":13}"#);
    }

    #[test]
    fn test_same_key_same_rank() {
        let router = router(16);
        let body = Bytes::from_static(br#"{"prompt":"hi"}"#);
        let first = router.route(&Method::POST, &keyed("ctx-7"), body.clone()).unwrap();
        let second = router.route(&Method::POST, &keyed("ctx-7"), body).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pass_through_cases() {
        let router = router(16);
        let body = Bytes::from_static(br#"{"prompt":"hi"}"#);

        // no key
        let routed = router.route(&Method::POST, &HeaderMap::new(), body.clone()).unwrap();
        assert_eq!(routed, RoutedBody { body: body.clone(), rank: None });

        // empty key
        let routed = router.route(&Method::POST, &keyed(""), body.clone()).unwrap();
        assert_eq!(routed, RoutedBody { body: body.clone(), rank: None });

        // GET with key and no body
        let routed = router.route(&Method::GET, &keyed("abc"), Bytes::new()).unwrap();
        assert_eq!(routed, RoutedBody { body: Bytes::new(), rank: None });

        // PUT with key and body
        let routed = router.route(&Method::PUT, &keyed("abc"), body.clone()).unwrap();
        assert_eq!(routed, RoutedBody { body, rank: None });
    }

    #[test]
    fn test_pass_through_skips_parsing() {
        let body = Bytes::from_static(b"not json");
        let routed = router(4).route(&Method::POST, &HeaderMap::new(), body.clone()).unwrap();
        assert_eq!(routed.body, body);
    }

    #[test]
    fn test_array_body_with_key_fails() {
        let err = router(16)
            .route(&Method::POST, &keyed("abc"), Bytes::from_static(b"[1,2,3]"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject("array")));
    }
}
