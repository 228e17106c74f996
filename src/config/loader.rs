//! Configuration loading from disk and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{join_errors, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// Command line arguments.
///
/// Every flag overrides the matching key of the optional TOML file.
#[derive(Debug, Default, Parser)]
#[command(name = "rank-router")]
#[command(
    about = "Cache-aware data parallel routing proxy",
    long_about = "Cache-aware data parallel routing proxy. Routes requests to consistent \
                  DP ranks based on a routing key header, so requests with shared \
                  context hit the same prefix cache.\n\n\
                  The proxy hashes the routing key, maps it to a rank with \
                  sha256(key) % dp-size and injects {\"data_parallel_rank\": <rank>} \
                  into POST JSON bodies. Requests without the routing header are \
                  forwarded unmodified."
)]
pub struct CliArgs {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend server URL [default: http://127.0.0.1:8000]
    #[arg(long)]
    pub backend: Option<String>,

    /// Number of data parallel ranks (must match the backend's DP size)
    #[arg(long)]
    pub dp_size: Option<u64>,

    /// Request header containing the routing key [default: X-SMG-Routing-Key]
    #[arg(long)]
    pub routing_header: Option<String>,

    /// Listen address [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port [default: 9000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Upstream request timeout in seconds [default: 600]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log level [default: info]
    #[arg(long)]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(self, config: &mut RouterConfig) {
        if let Some(backend) = self.backend {
            config.upstream.backend = backend;
        }
        if let Some(dp_size) = self.dp_size {
            config.routing.dp_size = dp_size;
        }
        if let Some(header) = self.routing_header {
            config.routing.header = header;
        }
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.upstream.timeout_secs = timeout;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration: defaults, then the file named by
/// `--config` (if any), then command line flags. Validation runs last so a
/// flag can fix a value the file left unset.
pub fn load_from_args(args: CliArgs) -> Result<RouterConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => RouterConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
