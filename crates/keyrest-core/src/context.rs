//! Per-request context.
//!
//! The router creates a [`RequestContext`] for every request, tags it with the
//! matched operation and hands it to the business handler with the record.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-ordered (UUIDv7) request identifier, echoed in error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The id as a UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// What a business handler knows about the request besides its record.
///
/// # Example
///
/// ```
/// use keyrest_core::RequestContext;
///
/// let ctx = RequestContext::new().with_operation("GetUser");
/// assert_eq!(ctx.operation(), Some("GetUser"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    operation: Option<&'static str>,
    received_at: Instant,
}

impl RequestContext {
    /// Starts a context for a request received now.
    #[must_use]
    pub fn new() -> Self {
        Self::for_request(RequestId::new())
    }

    /// Starts a context with a caller-chosen id.
    #[must_use]
    pub fn for_request(request_id: RequestId) -> Self {
        Self {
            request_id,
            operation: None,
            received_at: Instant::now(),
        }
    }

    /// Tags the context with the matched operation.
    #[must_use]
    pub fn with_operation(self, operation: &'static str) -> Self {
        Self {
            operation: Some(operation),
            ..self
        }
    }

    /// The request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The matched operation, once routing has happened.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        self.operation
    }

    /// Time since the request was received.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.received_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_displays_as_hyphenated_uuid() {
        let id = RequestId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(Uuid::parse_str(&text).unwrap(), id.uuid());
    }

    #[test]
    fn test_operation_tagging_keeps_id() {
        let id = RequestId::new();
        let ctx = RequestContext::for_request(id);
        assert!(ctx.operation().is_none());

        let ctx = ctx.with_operation("DeleteKey");
        assert_eq!(ctx.operation(), Some("DeleteKey"));
        assert_eq!(ctx.request_id(), id);
    }
}
