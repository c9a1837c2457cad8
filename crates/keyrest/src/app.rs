//! Wiring from [`KeyrestConfig`] to a ready-to-run [`Server`].

use std::sync::Arc;

use http::StatusCode;
use keyrest_codec::DecodeErrorKind;
use keyrest_config::{ErrorStatusConfig, KeyrestConfig};
use keyrest_core::KeyDirectory;
use keyrest_server::{routes, Server, StatusPolicy};
use thiserror::Error;

/// Errors while assembling a server from configuration.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configured status is not a valid HTTP status code.
    #[error("invalid status code {status} for errors.{setting}")]
    InvalidStatus {
        /// Setting name under `[errors]`.
        setting: &'static str,
        /// The configured value.
        status: u16,
    },
}

fn status(setting: &'static str, status: u16) -> Result<StatusCode, AppError> {
    StatusCode::from_u16(status).map_err(|_| AppError::InvalidStatus { setting, status })
}

/// Builds the decode-failure status policy from the `[errors]` section.
pub fn status_policy(errors: &ErrorStatusConfig) -> Result<StatusPolicy, AppError> {
    Ok(StatusPolicy::default()
        .with_status(
            DecodeErrorKind::PathBinding,
            status("path_binding", errors.path_binding)?,
        )
        .with_status(
            DecodeErrorKind::TimestampFormat,
            status("timestamp_format", errors.timestamp_format)?,
        )
        .with_status(DecodeErrorKind::Body, status("body_decode", errors.body_decode)?)
        .with_status(DecodeErrorKind::Query, status("query_decode", errors.query_decode)?)
        .with_body_read(status("body_read", errors.body_read)?)
        .with_payload_too_large(status("payload_too_large", errors.payload_too_large)?))
}

/// Listener settings from the `[server]` section.
#[must_use]
pub fn server_config(config: &KeyrestConfig) -> keyrest_server::ServerConfig {
    keyrest_server::ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.shutdown_timeout())
        .max_body_bytes(config.server.max_body_bytes)
        .build()
}

/// Builds a server exposing `directory` through the standard key-directory
/// routes.
pub fn build_server<S: KeyDirectory>(
    config: &KeyrestConfig,
    directory: Arc<S>,
) -> Result<Server<S>, AppError> {
    let policy = status_policy(&config.errors)?;
    let handler = routes::key_directory_routes().into_handler(directory, policy);
    Ok(Server::new(server_config(config), handler))
}
