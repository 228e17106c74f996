//! Startup orchestration.
//!
//! # Responsibilities
//! - Check the configuration; [`start`] is public and may be handed a config
//!   that never went through the loader
//! - Announce the routing setup
//! - Start the metrics endpoint when enabled
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::join_errors;
use crate::config::{validate_config, RouterConfig, ValidationError};
use crate::http::HttpServer;
use crate::lifecycle::signals;
use crate::observability::metrics;

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start the router and block until SIGINT or SIGTERM.
///
/// The configuration is checked again here, so programmatic callers get the
/// same errors the command line loader reports.
pub async fn start(config: RouterConfig) -> Result<(), StartupError> {
    validate_config(&config).map_err(StartupError::Config)?;

    tracing::info!(
        "Routing {} -> {} DP ranks @ {}",
        config.routing.header,
        config.routing.dp_size,
        config.upstream.backend
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address();
    let server = HttpServer::new(config).map_err(|e| StartupError::Config(vec![e]))?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address: address.clone(), source })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, signals::shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_rejects_unvalidated_config() {
        let mut config = RouterConfig::default();
        config.upstream.timeout_secs = 0;

        let err = start(config).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(ref errors) if errors.len() == 2));
        assert_eq!(
            err.to_string(),
            "invalid configuration: dp_size must be greater than 0, upstream.timeout_secs must be greater than 0"
        );
    }
}
