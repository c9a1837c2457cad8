//! Structured timestamps.
//!
//! Key-directory records carry times as `{seconds, nanos}` pairs. Clients
//! send RFC 3339 text instead; [`Timestamp::parse_rfc3339`] is the single
//! conversion point between the two.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// A point in time as seconds since the Unix epoch plus a sub-second remainder.
///
/// Invariant: `0 <= nanos < 1_000_000_000`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Timestamp {
    /// Seconds since 1970-01-01T00:00:00Z.
    pub seconds: i64,
    /// Nanoseconds past `seconds`.
    pub nanos: i32,
}

/// An RFC 3339 literal that could not be turned into a [`Timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid RFC 3339 timestamp '{literal}': {reason}")]
pub struct TimestampParseError {
    /// The rejected text.
    pub literal: String,
    /// Why it was rejected.
    pub reason: String,
}

impl Timestamp {
    /// Creates a timestamp from its parts.
    #[must_use]
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Parses an RFC 3339 date-time such as `2015-05-18T23:58:36.000Z`.
    ///
    /// The empty string is rejected. Leap seconds are rejected because they
    /// cannot be represented with `nanos < 1e9`.
    ///
    /// # Example
    ///
    /// ```
    /// use keyrest_core::Timestamp;
    ///
    /// let ts = Timestamp::parse_rfc3339("2015-05-18T23:58:36.000Z").unwrap();
    /// assert_eq!(ts, Timestamp::new(1_431_993_516, 0));
    /// assert!(Timestamp::parse_rfc3339("").is_err());
    /// ```
    pub fn parse_rfc3339(literal: &str) -> Result<Self, TimestampParseError> {
        let reject = |reason: String| TimestampParseError {
            literal: literal.to_string(),
            reason,
        };

        if literal.is_empty() {
            return Err(reject("empty timestamp".to_string()));
        }

        let parsed = DateTime::parse_from_rfc3339(literal).map_err(|e| reject(e.to_string()))?;
        let nanos = parsed.timestamp_subsec_nanos();
        if nanos >= NANOS_PER_SECOND {
            return Err(reject("leap seconds are not supported".to_string()));
        }

        Ok(Self {
            seconds: parsed.timestamp(),
            nanos: i32::try_from(nanos).map_err(|e| reject(e.to_string()))?,
        })
    }

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Returns `true` if `nanos` is within `[0, 1e9)`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        u32::try_from(self.nanos).is_ok_and(|n| n < NANOS_PER_SECOND)
    }

    /// Formats the timestamp as RFC 3339 in UTC, or `None` if it is out of range.
    #[must_use]
    pub fn to_rfc3339(&self) -> Option<String> {
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::<Utc>::from_timestamp(self.seconds, nanos)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    // a leap second keeps only its sub-second part
    #[allow(clippy::cast_possible_wrap)]
    fn from(dt: DateTime<Utc>) -> Self {
        let nanos = dt.timestamp_subsec_nanos() % NANOS_PER_SECOND;
        Self {
            seconds: dt.timestamp(),
            nanos: nanos as i32,
        }
    }
}
