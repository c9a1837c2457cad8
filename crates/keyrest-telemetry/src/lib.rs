//! Observability for keyrest services.
//!
//! - **Logging**: structured `tracing` output, JSON in production and
//!   human-readable during development
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `keyrest_requests_total` | Counter | `operation`, `status` | Total request count |
//! | `keyrest_request_duration_seconds` | Histogram | `operation` | Request latency |
//! | `keyrest_decode_failures_total` | Counter | `kind` | Requests rejected before dispatch |
//! | `keyrest_in_flight_requests` | Gauge | - | Currently processing requests |
//!
//! # Example
//!
//! ```rust,ignore
//! use keyrest_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::default(), &MetricsConfig::default())?;
//! tracing::info!("telemetry ready");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use crate::metrics::{init_metrics, render_metrics, InFlight, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Sets up logging first so metrics setup is itself logged.
///
/// # Errors
///
/// Whatever [`init_logging`] or [`init_metrics`] reports.
pub fn init_telemetry(log: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(log)?;
    init_metrics(metrics)?;
    Ok(())
}
