//! # keyrest codec
//!
//! Turns a raw HTTP request into a typed key-directory record.
//!
//! Decoding runs in a fixed order:
//!
//! | Step | Source | Component |
//! |------|--------|-----------|
//! | 1 | URL path | [`extract`] binds identifiers by segment index |
//! | 2 | Body | [`TimestampRewriter`] turns RFC 3339 literals into `{seconds, nanos}` |
//! | 3 | Body | `serde_json` fills the remaining fields |
//! | 4 | Query string | [`Decodable::bind_query`] for records that accept query parameters |
//!
//! ## Example
//!
//! ```rust
//! use keyrest_codec::{decode, PathBindings, RawRequest};
//! use keyrest_core::messages::CreateKeyRequest;
//! use keyrest_core::Timestamp;
//! use http::Method;
//!
//! let request = RawRequest::new(
//!     Method::POST,
//!     "/v1/users/alice@example.com/keys",
//!     None,
//!     r#"{"signed_key": {"key": {"creation_time": "2015-05-18T23:58:36.000Z"}}}"#,
//! );
//!
//! let record: CreateKeyRequest = decode(&request, &PathBindings::user(2)).unwrap();
//! assert_eq!(record.user_id, "alice@example.com");
//!
//! let created = record.signed_key.and_then(|s| s.key).and_then(|k| k.creation_time);
//! assert_eq!(created, Some(Timestamp::new(1_431_993_516, 0)));
//! ```

#![doc(html_root_url = "https://docs.rs/keyrest-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decode;
mod error;
mod path;
mod records;
mod rewrite;

pub use decode::{decode, Decodable, PathBindings, PathField, RawRequest};
pub use error::{DecodeError, DecodeErrorKind, PathError, TimestampFormatError};
pub use path::{extract, extract_decoded, path_segments};
pub use rewrite::{rewrite_all, TimestampRewriter, CREATION_TIME};
