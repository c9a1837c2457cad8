//! Status codes for requests rejected before dispatch.

use http::StatusCode;
use keyrest_codec::DecodeErrorKind;

/// Maps decode failures, unreadable bodies and oversized bodies to HTTP
/// statuses.
///
/// Every status defaults to `400 Bad Request`, except
/// [`payload_too_large`](Self::payload_too_large) which defaults to `413`.
/// Handler errors are not affected; they carry their own category.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use keyrest_codec::DecodeErrorKind;
/// use keyrest_server::StatusPolicy;
///
/// let policy = StatusPolicy::default()
///     .with_status(DecodeErrorKind::TimestampFormat, StatusCode::UNPROCESSABLE_ENTITY);
///
/// assert_eq!(policy.status_for(DecodeErrorKind::Body), StatusCode::BAD_REQUEST);
/// assert_eq!(
///     policy.status_for(DecodeErrorKind::TimestampFormat),
///     StatusCode::UNPROCESSABLE_ENTITY
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Identifier could not be bound from the path.
    pub path_binding: StatusCode,
    /// Timestamp literal was malformed.
    pub timestamp_format: StatusCode,
    /// Body was not valid JSON for the record.
    pub body_decode: StatusCode,
    /// Query string was malformed.
    pub query_decode: StatusCode,
    /// Body could not be read off the connection.
    pub body_read: StatusCode,
    /// Body exceeded the configured size limit.
    pub payload_too_large: StatusCode,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            path_binding: StatusCode::BAD_REQUEST,
            timestamp_format: StatusCode::BAD_REQUEST,
            body_decode: StatusCode::BAD_REQUEST,
            query_decode: StatusCode::BAD_REQUEST,
            body_read: StatusCode::BAD_REQUEST,
            payload_too_large: StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl StatusPolicy {
    /// Returns the status for a decode failure kind.
    #[must_use]
    pub const fn status_for(&self, kind: DecodeErrorKind) -> StatusCode {
        match kind {
            DecodeErrorKind::PathBinding => self.path_binding,
            DecodeErrorKind::TimestampFormat => self.timestamp_format,
            DecodeErrorKind::Body => self.body_decode,
            DecodeErrorKind::Query => self.query_decode,
        }
    }

    /// Overrides the status for one decode failure kind.
    #[must_use]
    pub fn with_status(mut self, kind: DecodeErrorKind, status: StatusCode) -> Self {
        match kind {
            DecodeErrorKind::PathBinding => self.path_binding = status,
            DecodeErrorKind::TimestampFormat => self.timestamp_format = status,
            DecodeErrorKind::Body => self.body_decode = status,
            DecodeErrorKind::Query => self.query_decode = status,
        }
        self
    }

    /// Overrides the status for bodies that fail to arrive.
    #[must_use]
    pub fn with_body_read(mut self, status: StatusCode) -> Self {
        self.body_read = status;
        self
    }

    /// Overrides the status for oversized bodies.
    #[must_use]
    pub fn with_payload_too_large(mut self, status: StatusCode) -> Self {
        self.payload_too_large = status;
        self
    }
}
