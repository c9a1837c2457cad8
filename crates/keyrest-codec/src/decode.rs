//! Request-to-record decoding.

use std::fmt;

use bytes::Bytes;
use http::Method;
use serde::de::DeserializeOwned;

use crate::path::{extract_decoded, path_segments};
use crate::rewrite::{rewrite_all, CREATION_TIME};
use crate::DecodeError;

/// Identifiers that records take from the URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathField {
    /// The owning user.
    UserId,
    /// A key of that user.
    KeyId,
}

impl PathField {
    /// Record field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::KeyId => "key_id",
        }
    }
}

impl fmt::Display for PathField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a route's identifiers live in its path.
///
/// `None` means the route does not carry that identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathBindings {
    /// Segment index of the user id.
    pub user_id: Option<usize>,
    /// Segment index of the key id.
    pub key_id: Option<usize>,
}

impl PathBindings {
    /// Binds nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            user_id: None,
            key_id: None,
        }
    }

    /// Binds only the user id.
    #[must_use]
    pub const fn user(user_id: usize) -> Self {
        Self {
            user_id: Some(user_id),
            key_id: None,
        }
    }

    /// Binds both the user id and the key id.
    #[must_use]
    pub const fn user_and_key(user_id: usize, key_id: usize) -> Self {
        Self {
            user_id: Some(user_id),
            key_id: Some(key_id),
        }
    }

    /// Builds bindings from signed indices, treating negatives as unbound.
    ///
    /// ```rust
    /// use keyrest_codec::PathBindings;
    ///
    /// assert_eq!(PathBindings::from_indices(2, -1), PathBindings::user(2));
    /// ```
    #[must_use]
    pub fn from_indices(user_id: isize, key_id: isize) -> Self {
        Self {
            user_id: usize::try_from(user_id).ok(),
            key_id: usize::try_from(key_id).ok(),
        }
    }

    /// Returns the segment index bound to `field`.
    #[must_use]
    pub const fn index_of(&self, field: PathField) -> Option<usize> {
        match field {
            PathField::UserId => self.user_id,
            PathField::KeyId => self.key_id,
        }
    }
}

/// The parts of an HTTP request that decoding looks at.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// Request method.
    pub method: Method,
    /// URL path, without the query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Raw body.
    pub body: Bytes,
}

impl RawRequest {
    /// Creates a raw request.
    #[must_use]
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Option<&str>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            query: query.map(str::to_string),
            body: body.into(),
        }
    }
}

impl From<http::Request<Bytes>> for RawRequest {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            body,
        }
    }
}

/// A record that can be decoded from a [`RawRequest`].
///
/// Implementations declare which identifiers they take from the path and
/// which body keywords carry RFC 3339 timestamps. Decoding starts from
/// `Self::default()`, so fields absent everywhere keep their zero value.
pub trait Decodable: DeserializeOwned + Default + Send + 'static {
    /// Operation name used in logs and metrics.
    const OPERATION: &'static str;

    /// Identifiers that must be bound from the path.
    const PATH_FIELDS: &'static [PathField] = &[];

    /// Body keywords whose quoted values are rewritten as timestamps.
    const TIMESTAMP_FIELDS: &'static [&'static str] = &[CREATION_TIME];

    /// Stores a path-bound identifier. Only called for fields listed in
    /// [`Self::PATH_FIELDS`].
    fn bind_path_field(&mut self, field: PathField, value: String);

    /// Applies query parameters. The default ignores them.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the query string is malformed.
    fn bind_query(&mut self, _query: &str) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// Decodes `request` into `T`.
///
/// Path identifiers are bound after the body is decoded, so a value in the
/// path always wins over the same field in the body.
///
/// # Errors
///
/// Any [`DecodeError`]; on error no partially decoded record escapes.
pub fn decode<T: Decodable>(request: &RawRequest, bindings: &PathBindings) -> Result<T, DecodeError> {
    let segments = path_segments(&request.path);
    let mut path_values = Vec::with_capacity(T::PATH_FIELDS.len());
    for &field in T::PATH_FIELDS {
        let index = bindings
            .index_of(field)
            .ok_or(DecodeError::UnboundPathField { field })?;
        let signed = isize::try_from(index).unwrap_or(isize::MAX);
        let value = extract_decoded(&segments, signed)
            .map_err(|source| DecodeError::PathBinding { field, source })?;
        path_values.push((field, value.into_owned()));
    }

    let body = rewrite_all(&request.body, T::TIMESTAMP_FIELDS)?;
    let mut record: T = if body.iter().all(u8::is_ascii_whitespace) {
        T::default()
    } else {
        serde_json::from_slice(&body)?
    };

    for (field, value) in path_values {
        record.bind_path_field(field, value);
    }

    if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
        record.bind_query(query)?;
    }

    tracing::trace!(operation = T::OPERATION, "request decoded");
    Ok(record)
}
