//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("config file {} does not exist", .path.display())]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("cannot read config file {}", .path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Only TOML and JSON are understood.
    #[error("unsupported config format '{0}', expected toml or json")]
    UnsupportedFormat(String),

    /// TOML syntax error or unknown field.
    #[error("malformed TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax error or unknown field.
    #[error("malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment override could not be parsed.
    #[error("cannot apply {var}: {expected}")]
    Env {
        /// Variable name.
        var: String,
        /// What the value should have looked like.
        expected: &'static str,
    },

    /// A setting parsed but is not acceptable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted setting name, e.g. `server.http_addr`.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn env(var: &str, expected: &'static str) -> Self {
        Self::Env {
            var: var.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
