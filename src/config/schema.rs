//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the rank router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Routing key and partition settings.
    pub routing: RoutingConfig,

    /// Backend the router forwards to.
    pub upstream: UpstreamConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Listen host (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
        }
    }
}

/// Routing key extraction and rank assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Number of data parallel ranks behind the backend. Must be > 0.
    pub dp_size: u64,

    /// Request header carrying the routing key.
    pub header: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            // Unset; validation rejects zero.
            dp_size: 0,
            header: "X-SMG-Routing-Key".to_string(),
        }
    }
}

/// Upstream backend and connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Backend base URL (e.g., "http://127.0.0.1:8000").
    pub backend: String,

    /// Deadline for the whole upstream exchange in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections kept for the backend.
    pub pool_max_idle_per_host: usize,

    /// Strip hop-by-hop headers from relayed responses.
    pub strip_hop_by_hop: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            backend: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 600,
            connect_timeout_secs: 10,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 64,
            strip_hop_by_hop: false,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.upstream.backend, "http://127.0.0.1:8000");
        assert_eq!(config.upstream.timeout_secs, 600);
        assert_eq!(config.routing.header, "X-SMG-Routing-Key");
        assert_eq!(config.routing.dp_size, 0);
    }

    #[test]
    fn test_partial_toml() {
        let config: RouterConfig = toml::from_str(
            r#"
            [routing]
            dp_size = 8

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.routing.dp_size, 8);
        assert_eq!(config.routing.header, "X-SMG-Routing-Key");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.port, 9000);
    }

    #[test]
    fn test_ipv6_bind_address() {
        let listener = ListenerConfig { host: "::1".into(), port: 9000 };
        assert_eq!(listener.bind_address(), "[::1]:9000");
    }
}
