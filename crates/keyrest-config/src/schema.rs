//! Configuration file sections.
//!
//! Every section is `#[serde(default)]`, so a file only names what it changes
//! and unknown keys are rejected.

use serde::{Deserialize, Serialize};

pub use keyrest_telemetry::LogFormat;

/// `[server]`: the HTTP listener.
///
/// ```
/// use keyrest_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.max_body_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub http_addr: String,
    /// Seconds to wait for open connections after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
            max_body_bytes: 1 << 20,
        }
    }
}

/// `[logging]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `keyrest_server=debug`.
    pub level: String,
    /// Line rendering.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// `[metrics]`: the Prometheus scrape endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the recorder.
    pub enabled: bool,
    /// Scrape endpoint, `host:port`.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// `[errors]`: statuses for requests rejected before a handler runs.
///
/// Handler errors are answered with their category's status instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorStatusConfig {
    /// Identifier missing from the path.
    pub path_binding: u16,
    /// Malformed timestamp literal.
    pub timestamp_format: u16,
    /// Body is not JSON for the record.
    pub body_decode: u16,
    /// Malformed query string.
    pub query_decode: u16,
    /// Body could not be read off the connection.
    pub body_read: u16,
    /// Body larger than `server.max_body_bytes`.
    pub payload_too_large: u16,
}

impl Default for ErrorStatusConfig {
    fn default() -> Self {
        Self {
            path_binding: 400,
            timestamp_format: 400,
            body_decode: 400,
            query_decode: 400,
            body_read: 400,
            payload_too_large: 413,
        }
    }
}

impl ErrorStatusConfig {
    /// Setting names paired with their values.
    pub(crate) fn entries(&self) -> [(&'static str, u16); 6] {
        [
            ("errors.path_binding", self.path_binding),
            ("errors.timestamp_format", self.timestamp_format),
            ("errors.body_decode", self.body_decode),
            ("errors.query_decode", self.query_decode),
            ("errors.body_read", self.body_read),
            ("errors.payload_too_large", self.payload_too_large),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_error_status_defaults() {
        let config = ErrorStatusConfig::default();
        assert_eq!(config.path_binding, 400);
        assert_eq!(config.timestamp_format, 400);
        assert_eq!(config.body_read, 400);
        assert_eq!(config.payload_too_large, 413);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: ServerConfig = toml::from_str("http_addr = \"127.0.0.1:3000\"").unwrap();
        assert_eq!(config.http_addr, "127.0.0.1:3000");
        assert_eq!(config.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<MetricsConfig, _> = toml::from_str("enabled = true\nport = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_in_toml() {
        let config: LoggingConfig = toml::from_str("format = \"pretty\"").unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "info");
    }
}
