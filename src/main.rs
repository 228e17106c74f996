//! Cache-aware data parallel rank router.
//!
//! A reverse proxy in front of a data parallel LLM server. Requests that
//! carry a routing key header are pinned to one DP rank so requests sharing
//! context reuse that rank's prefix cache.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌────────────────────────────────────────────────┐
//!                          │                  RANK ROUTER                   │
//!                          │                                                │
//!     Client Request       │  ┌─────────┐   ┌─────────┐   ┌─────────────┐   │
//!     ─────────────────────┼─▶│  http   │──▶│ routing │──▶│   rewrite   │   │
//!                          │  │ server  │   │ key→rank│   │ inject rank │   │
//!                          │  └─────────┘   └─────────┘   └──────┬──────┘   │
//!                          │                                     │          │
//!                          │                                     ▼          │
//!     Client Response      │  ┌─────────┐                 ┌─────────────┐   │
//!     ◀────────────────────┼──│  relay  │◀────────────────│  forwarder  │◀──┼──── Backend
//!                          │  │verbatim │                 │ pooled conn │   │     (DP ranks)
//!                          │  └─────────┘                 └─────────────┘   │
//!                          │                                                │
//!                          │  config · observability · lifecycle            │
//!                          └────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```text
//! # Basic usage with 16 DP ranks
//! rank-router --backend http://10.20.2.21:8000 --dp-size 16
//!
//! # Custom port and routing header
//! rank-router --backend http://gpu01:8000 --dp-size 8 --port 8080 --routing-header X-My-Key
//! ```

use clap::Parser;

use rank_router::config::{loader, CliArgs};
use rank_router::lifecycle;
use rank_router::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = loader::load_from_args(CliArgs::parse())?;

    logging::init_logging(&config.observability);

    tracing::info!("rank-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        backend = %config.upstream.backend,
        dp_size = config.routing.dp_size,
        routing_header = %config.routing.header,
        timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
