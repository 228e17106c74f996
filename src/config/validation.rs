//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (dp_size > 0, timeouts > 0)
//! - Check the backend URL is something the upstream client can reach
//! - Check header names and the metrics address parse
//! - Check the listen host is well formed; resolving it is left to bind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dp_size must be greater than 0")]
    ZeroPartitions,

    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBackend { url: String, reason: String },

    #[error("invalid routing header name '{0}'")]
    InvalidHeader(String),

    #[error("{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("invalid listen address '{0}'")]
    InvalidListenAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routing.dp_size == 0 {
        errors.push(ValidationError::ZeroPartitions);
    }

    if HeaderName::from_bytes(config.routing.header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeader(config.routing.header.clone()));
    }

    if let Err(e) = validate_backend(&config.upstream.backend) {
        errors.push(e);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.connect_timeout_secs"));
    }

    if !valid_listen_host(&config.listener.host) {
        errors.push(ValidationError::InvalidListenAddress(config.listener.bind_address()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An IP literal or a hostname such as `localhost`.
fn valid_listen_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    !host.is_empty() && !host.contains(|c: char| c.is_whitespace() || c == '/' || c == '@')
}

/// One line listing every error, for display.
pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The upstream client speaks plain HTTP only, and the base URL is joined
/// with the request path, so it cannot carry a query or fragment.
fn validate_backend(backend: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidBackend {
        url: backend.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(backend).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("scheme must be http"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not contain a query or fragment"));
    }
    Ok(())
}
