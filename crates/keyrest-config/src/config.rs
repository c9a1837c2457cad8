//! Top-level configuration.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ErrorStatusConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig};

/// Complete keyrest server configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use keyrest_config::KeyrestConfig;
///
/// let config = KeyrestConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct KeyrestConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Statuses for requests rejected before dispatch.
    #[serde(default)]
    pub errors: ErrorStatusConfig,
}

impl KeyrestConfig {
    /// Checks addresses, sizes and status codes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        for (field, status) in self.errors.entries() {
            if !(400..=599).contains(&status) {
                return Err(ConfigError::invalid(
                    field,
                    format!("{status} is not an HTTP error status"),
                ));
            }
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs, no metrics listener.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..Default::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            metrics: MetricsConfig {
                enabled: false,
                ..Default::default()
            },
            errors: ErrorStatusConfig::default(),
        }
    }

    /// Production preset: JSON info logs, metrics on.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Logging settings in the form the telemetry crate expects.
    #[must_use]
    pub fn log_config(&self) -> keyrest_telemetry::LogConfig {
        keyrest_telemetry::LogConfig {
            level: self.logging.level.clone(),
            format: self.logging.format,
            with_location: self.logging.format == LogFormat::Pretty,
        }
    }

    /// Metrics settings in the form the telemetry crate expects.
    #[must_use]
    pub fn metrics_config(&self) -> keyrest_telemetry::MetricsConfig {
        keyrest_telemetry::MetricsConfig {
            enabled: self.metrics.enabled,
            addr: self.metrics.addr.clone(),
        }
    }
}
