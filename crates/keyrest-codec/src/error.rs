//! Decode error types.

use keyrest_core::TimestampParseError;
use thiserror::Error;

use crate::PathField;

/// Failure to read a component out of a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The requested segment index does not exist.
    #[error("path component index {index} out of range for {len} segment(s)")]
    IndexOutOfRange {
        /// The requested index.
        index: isize,
        /// Number of segments in the path.
        len: usize,
    },

    /// The segment is not valid percent-encoded UTF-8.
    #[error("path component '{segment}' is not valid percent-encoded UTF-8")]
    InvalidEncoding {
        /// The raw segment.
        segment: String,
    },
}

/// A keyword's value was a quoted string but not a valid RFC 3339 timestamp.
///
/// The body that was being rewritten is left exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad timestamp for '{keyword}' at byte {offset}: {source}")]
pub struct TimestampFormatError {
    /// The keyword whose value was rejected.
    pub keyword: String,
    /// Byte offset of the rejected literal (just past its opening quote).
    pub offset: usize,
    /// Parse failure.
    #[source]
    pub source: TimestampParseError,
}

/// Coarse classification of decode failures.
///
/// The server maps each kind to an HTTP status and uses it as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// An identifier could not be bound from the URL path.
    PathBinding,
    /// A timestamp literal was malformed.
    TimestampFormat,
    /// The JSON body could not be decoded into the record.
    Body,
    /// The query string could not be decoded.
    Query,
}

impl DecodeErrorKind {
    /// Machine-readable code used in error envelopes and metric labels.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PathBinding => "PATH_BINDING_ERROR",
            Self::TimestampFormat => "TIMESTAMP_FORMAT_ERROR",
            Self::Body => "BODY_DECODE_ERROR",
            Self::Query => "QUERY_DECODE_ERROR",
        }
    }
}

/// Error that stops a request from reaching its business handler.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The route does not say where in the path this identifier lives.
    #[error("{field} is not bound to any path segment")]
    UnboundPathField {
        /// The record field that needed a path binding.
        field: PathField,
    },

    /// The identifier's path segment is missing or malformed.
    #[error("cannot bind {field} from path: {source}")]
    PathBinding {
        /// The record field being bound.
        field: PathField,
        /// Extraction failure.
        #[source]
        source: PathError,
    },

    /// A timestamp in the body was malformed.
    #[error(transparent)]
    TimestampFormat(#[from] TimestampFormatError),

    /// A timestamp in the query string was malformed.
    #[error("bad timestamp in query parameter '{parameter}': {source}")]
    QueryTimestamp {
        /// Query parameter name.
        parameter: &'static str,
        /// Parse failure.
        #[source]
        source: TimestampParseError,
    },

    /// The (rewritten) body is not a valid JSON encoding of the record.
    #[error("invalid request body: {0}")]
    Body(#[from] serde_json::Error),

    /// The query string could not be decoded.
    #[error("invalid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
}

impl DecodeError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::UnboundPathField { .. } | Self::PathBinding { .. } => {
                DecodeErrorKind::PathBinding
            }
            Self::TimestampFormat(_) | Self::QueryTimestamp { .. } => {
                DecodeErrorKind::TimestampFormat
            }
            Self::Body(_) => DecodeErrorKind::Body,
            Self::Query(_) => DecodeErrorKind::Query,
        }
    }
}
