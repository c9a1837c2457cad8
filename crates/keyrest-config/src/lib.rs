//! Typed configuration for keyrest servers.
//!
//! Configuration is layered: built-in defaults, then an optional TOML or
//! JSON file, then environment variables.
//!
//! # Example
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [errors]
//! path_binding = 400
//! timestamp_format = 400
//! body_decode = 400
//! query_decode = 400
//! body_read = 400
//! payload_too_large = 413
//! ```
//!
//! Unknown fields are rejected so typos surface at startup.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::KeyrestConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{ErrorStatusConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig};
