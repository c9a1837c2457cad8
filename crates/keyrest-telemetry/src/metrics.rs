//! Prometheus metrics.
//!
//! The recording functions go through the `metrics` facade, so they do nothing
//! until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Counter of finished requests, labelled `operation` and `status`.
pub const REQUESTS_TOTAL: &str = "keyrest_requests_total";
/// Latency histogram, labelled `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "keyrest_request_duration_seconds";
/// Counter of requests rejected before dispatch, labelled `kind`.
pub const DECODE_FAILURES_TOTAL: &str = "keyrest_decode_failures_total";
/// Gauge of requests being handled right now.
pub const IN_FLIGHT_REQUESTS: &str = "keyrest_in_flight_requests";

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Install the recorder and serve the scrape endpoint.
    pub enabled: bool,
    /// Scrape endpoint address.
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

/// Installs the global Prometheus recorder and spawns its scrape listener.
///
/// Must run inside a tokio runtime. Does nothing when metrics are disabled.
///
/// # Errors
///
/// [`TelemetryError::MetricsAddress`] for an unparsable address,
/// [`TelemetryError::Exporter`] if the exporter cannot be built and
/// [`TelemetryError::AlreadyInstalled`] if another recorder is set.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr =
        config
            .addr
            .parse()
            .map_err(|source| TelemetryError::MetricsAddress {
                addr: config.addr.clone(),
                source,
            })?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|e| TelemetryError::AlreadyInstalled {
        subsystem: "metrics",
        reason: e.to_string(),
    })?;
    let _ = HANDLE.set(handle);

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "metrics listener stopped");
        }
    });

    describe();
    tracing::info!(%addr, "serving Prometheus metrics");
    Ok(())
}

/// Current metrics in Prometheus text format, `None` before [`init_metrics`].
#[must_use]
pub fn render_metrics() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

fn describe() {
    describe_counter!(REQUESTS_TOTAL, "Requests answered, by operation and status");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Time from request receipt to response"
    );
    describe_counter!(DECODE_FAILURES_TOTAL, "Requests rejected while decoding");
    describe_gauge!(IN_FLIGHT_REQUESTS, "Requests currently being handled");
}

/// Records a finished request.
pub fn record_request(operation: &'static str, status: u16, elapsed: Duration) {
    counter!(REQUESTS_TOTAL, "operation" => operation, "status" => status.to_string())
        .increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "operation" => operation).record(elapsed.as_secs_f64());
}

/// Records a request rejected during decoding.
pub fn record_decode_failure(kind: &'static str) {
    counter!(DECODE_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Holds one unit of the in-flight gauge until dropped.
#[derive(Debug)]
#[must_use = "the request stops counting as in flight when the guard drops"]
pub struct InFlight(());

impl InFlight {
    /// Counts a request as in flight.
    pub fn enter() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self(())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}
