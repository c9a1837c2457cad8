//! Error types for business handlers.
//!
//! [`RestError`] is what a [`KeyDirectory`](crate::KeyDirectory) implementation
//! returns when an operation fails. Every error carries an
//! [`ErrorCategory`], and each category carries a default HTTP status.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`RestError`].
pub type RestResult<T> = Result<T, RestError>;

/// Categories of handler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request was understood but its content is not acceptable.
    Validation,
    /// The user or key does not exist.
    NotFound,
    /// The resource already exists or was modified concurrently.
    Conflict,
    /// The directory backend is temporarily unavailable.
    Unavailable,
    /// Anything else; details stay in the logs.
    Internal,
}

impl ErrorCategory {
    /// Default HTTP status for the category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code used in error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Unavailable => "UNAVAILABLE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Error returned by key-directory business handlers.
///
/// # Example
///
/// ```
/// use keyrest_core::{ErrorCategory, RestError};
///
/// let err = RestError::not_found_resource("user", "alice@example.com");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
/// assert_eq!(err.to_string(), "user 'alice@example.com' not found");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RestError {
    category: ErrorCategory,
    message: String,
    details: Option<serde_json::Value>,
    /// Never sent to clients.
    #[source]
    source: Option<anyhow::Error>,
}

impl RestError {
    /// Creates an error of any category.
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Request content rejected by the business logic.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    /// Like [`validation`](Self::validation), naming the offending field.
    #[must_use]
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::validation(message).with_details(serde_json::json!({ "field": field }))
    }

    /// Missing user or key.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, message)
    }

    /// Missing resource of a known type and id.
    #[must_use]
    pub fn not_found_resource(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        Self::not_found(format!("{resource_type} '{resource_id}' not found")).with_details(
            serde_json::json!({ "resource_type": resource_type, "resource_id": resource_id }),
        )
    }

    /// Conflicting state.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Conflict, message)
    }

    /// Backend temporarily unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unavailable, message)
    }

    /// Internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, message)
    }

    /// Internal failure caused by `source`.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::internal(message)
        }
    }

    /// Attaches structured details for the client.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    /// The client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Default HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category.default_status_code()
    }

    /// Builds the client-facing envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.category.code().to_string(),
                message: self.message.clone(),
                category: Some(self.category),
                details: self.details.clone(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// JSON body of every error response.
///
/// ```json
/// {"error": {"code": "NOT_FOUND", "message": "...", "category": "not_found"}, "request_id": "..."}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error itself.
    pub error: ErrorDetail,
    /// Correlates the response with server logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorEnvelope {
    /// Builds an envelope for errors raised outside business handlers
    /// (routing, decoding, transport).
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                category: None,
                details: None,
            },
            request_id: None,
        }
    }

    /// Sets the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

/// The `error` object of an [`ErrorEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable code, e.g. `TIMESTAMP_FORMAT_ERROR`.
    pub code: String,
    /// Human-readable explanation.
    pub message: String,
    /// Handler error category, absent for routing and decode errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// Structured context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
