//! Telemetry error types.

use thiserror::Error;

/// Why logging or metrics could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive did not parse.
    #[error("bad log filter '{directive}': {reason}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// The log format name is neither `json` nor `pretty`.
    #[error("unknown log format '{0}'")]
    UnknownFormat(String),

    /// A global subscriber or recorder is already in place.
    #[error("{subsystem} already initialized: {reason}")]
    AlreadyInstalled {
        /// `logging` or `metrics`.
        subsystem: &'static str,
        /// Underlying message.
        reason: String,
    },

    /// The scrape endpoint address did not parse.
    #[error("bad metrics address '{addr}'")]
    MetricsAddress {
        /// The rejected address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The Prometheus exporter could not be built.
    #[error("cannot build Prometheus exporter: {0}")]
    Exporter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = TelemetryError::UnknownFormat("xml".to_string());
        assert_eq!(err.to_string(), "unknown log format 'xml'");

        let err = TelemetryError::AlreadyInstalled {
            subsystem: "metrics",
            reason: "recorder set".to_string(),
        };
        assert_eq!(err.to_string(), "metrics already initialized: recorder set");

        let source = "nowhere".parse::<std::net::SocketAddr>().unwrap_err();
        let err = TelemetryError::MetricsAddress {
            addr: "nowhere".to_string(),
            source,
        };
        assert_eq!(err.to_string(), "bad metrics address 'nowhere'");
        assert!(std::error::Error::source(&err).is_some());
    }
}
