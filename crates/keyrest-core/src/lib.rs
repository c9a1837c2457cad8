//! # keyrest core
//!
//! Core types shared by every keyrest crate:
//!
//! - [`RestError`] - Error type returned by business handlers, with status mapping
//! - [`RequestContext`] / [`RequestId`] - Per-request context handed to handlers
//! - [`Timestamp`] - Structured `{seconds, nanos}` timestamp
//! - [`messages`] - Key-directory request and response records
//! - [`KeyDirectory`] - The business-logic contract served over REST

#![doc(html_root_url = "https://docs.rs/keyrest-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
pub mod messages;
mod service;
mod timestamp;

pub use context::{RequestContext, RequestId};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, RestError, RestResult};
pub use service::KeyDirectory;
pub use timestamp::{Timestamp, TimestampParseError};
