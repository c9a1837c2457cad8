//! Raw-text timestamp rewriting.
//!
//! Record schemas carry times as `{"seconds": S, "nanos": N}` objects, while
//! REST clients send RFC 3339 strings. [`TimestampRewriter`] bridges the two
//! by scanning the raw body text (no JSON tree is built) and replacing
//!
//! ```text
//! "creation_time": "2015-05-18T23:58:36.000Z"
//! ```
//!
//! with
//!
//! ```text
//! "creation_time": {"seconds": 1431993516, "nanos": 0}
//! ```
//!
//! All bytes outside the replaced literals are preserved, so the result can
//! be handed to any JSON decoder that accepted the original.
//!
//! # Matching rules
//!
//! An occurrence of the keyword matches only when it is followed, after an
//! optional closing `"` of the keyword itself, by exactly `: "` and a later
//! closing `"`. Occurrences that do not match (unquoted value, different
//! spacing, unterminated string) are left alone and are not errors. A matched
//! value that is not a valid RFC 3339 timestamp, the empty string included,
//! fails the whole rewrite and no edits are kept.

use std::borrow::Cow;

use bytes::Bytes;
use keyrest_core::{Timestamp, TimestampParseError};

use crate::TimestampFormatError;

/// Field name of key creation times.
pub const CREATION_TIME: &str = "creation_time";

/// What must follow the keyword (and its optional closing quote).
const ANCHOR: &[u8] = b": \"";

/// Scanner states, advanced one step per loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for the next keyword occurrence at or after `from`.
    Seek { from: usize },
    /// Keyword found; checking for the `: "` anchor after it.
    AnchorCheck { keyword_end: usize },
    /// Anchor found; looking for the closing quote of the value.
    CaptureValue { keyword_end: usize, value_start: usize },
    /// `input[value_start..value_end]` is the candidate literal.
    ParseAndSubstitute { value_start: usize, value_end: usize },
}

/// Outcome of a successful scan.
struct Rewrite<'a> {
    output: Cow<'a, [u8]>,
    substitutions: usize,
}

/// Rewrites RFC 3339 values of one keyword into structured timestamps.
///
/// # Example
///
/// ```rust
/// use keyrest_codec::TimestampRewriter;
///
/// let rewriter = TimestampRewriter::new("creation_time");
///
/// let out = rewriter
///     .rewrite(br#"{"creation_time": "2015-05-18T23:58:36.000Z"}"#)
///     .unwrap();
/// assert_eq!(&*out, br#"{"creation_time": {"seconds": 1431993516, "nanos": 0}}"#);
///
/// // Unquoted values are not touched.
/// let out = rewriter.rewrite(br#""creation_time": invalid"#).unwrap();
/// assert_eq!(&*out, br#""creation_time": invalid"#);
///
/// // Quoted values that are not timestamps are rejected.
/// assert!(rewriter.rewrite(br#""creation_time": """#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRewriter {
    keyword: String,
}

impl TimestampRewriter {
    /// Creates a rewriter for `keyword`.
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// Returns the keyword this rewriter looks for.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Rewrites `input`, borrowing it unchanged when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampFormatError`] for the first matched value that is
    /// not a valid timestamp. `input` itself is never modified.
    pub fn rewrite<'a>(&self, input: &'a [u8]) -> Result<Cow<'a, [u8]>, TimestampFormatError> {
        self.scan(input).map(|rewrite| rewrite.output)
    }

    /// Rewrites a request body in place and returns the number of
    /// substitutions.
    ///
    /// On error `body` is left exactly as it was.
    pub fn rewrite_body(&self, body: &mut Bytes) -> Result<usize, TimestampFormatError> {
        let Rewrite {
            output,
            substitutions,
        } = self.scan(body)?;
        let rewritten = match output {
            Cow::Owned(rewritten) => Some(rewritten),
            Cow::Borrowed(_) => None,
        };
        if let Some(rewritten) = rewritten {
            *body = Bytes::from(rewritten);
        }
        Ok(substitutions)
    }

    fn scan<'a>(&self, input: &'a [u8]) -> Result<Rewrite<'a>, TimestampFormatError> {
        let keyword = self.keyword.as_bytes();
        let mut output: Option<Vec<u8>> = None;
        // input[..copied] has already been emitted into `output`
        let mut copied = 0;
        let mut substitutions = 0;
        let mut state = ScanState::Seek { from: 0 };

        if keyword.is_empty() {
            return Ok(Rewrite {
                output: Cow::Borrowed(input),
                substitutions,
            });
        }

        loop {
            state = match state {
                ScanState::Seek { from } => match find(input, keyword, from) {
                    Some(at) => ScanState::AnchorCheck {
                        keyword_end: at + keyword.len(),
                    },
                    None => break,
                },

                ScanState::AnchorCheck { keyword_end } => {
                    let mut cursor = keyword_end;
                    if input.get(cursor) == Some(&b'"') {
                        cursor += 1;
                    }
                    let anchored = input
                        .get(cursor..)
                        .is_some_and(|rest| rest.starts_with(ANCHOR));
                    if anchored {
                        ScanState::CaptureValue {
                            keyword_end,
                            value_start: cursor + ANCHOR.len(),
                        }
                    } else {
                        ScanState::Seek { from: keyword_end }
                    }
                }

                ScanState::CaptureValue {
                    keyword_end,
                    value_start,
                } => match find_byte(input, b'"', value_start) {
                    Some(value_end) => ScanState::ParseAndSubstitute {
                        value_start,
                        value_end,
                    },
                    None => ScanState::Seek { from: keyword_end },
                },

                ScanState::ParseAndSubstitute {
                    value_start,
                    value_end,
                } => {
                    let literal = &input[value_start..value_end];
                    let timestamp = parse_literal(literal).map_err(|source| {
                        tracing::debug!(
                            keyword = %self.keyword,
                            offset = value_start,
                            "rejecting malformed timestamp literal"
                        );
                        TimestampFormatError {
                            keyword: self.keyword.clone(),
                            offset: value_start,
                            source,
                        }
                    })?;

                    let out = output.get_or_insert_with(|| Vec::with_capacity(input.len() + 32));
                    // the opening quote sits right before value_start
                    out.extend_from_slice(&input[copied..value_start - 1]);
                    out.extend_from_slice(
                        format!(
                            "{{\"seconds\": {}, \"nanos\": {}}}",
                            timestamp.seconds, timestamp.nanos
                        )
                        .as_bytes(),
                    );
                    copied = value_end + 1;
                    substitutions += 1;
                    ScanState::Seek { from: copied }
                }
            };
        }

        let output = match output {
            Some(mut out) => {
                out.extend_from_slice(&input[copied..]);
                Cow::Owned(out)
            }
            None => Cow::Borrowed(input),
        };

        Ok(Rewrite {
            output,
            substitutions,
        })
    }
}

/// Applies one rewriter per keyword, in order.
///
/// Fails on the first error; `input` is never modified.
pub fn rewrite_all<'a>(
    input: &'a [u8],
    keywords: &[&str],
) -> Result<Cow<'a, [u8]>, TimestampFormatError> {
    let mut current = Cow::Borrowed(input);
    for keyword in keywords {
        let next = match TimestampRewriter::new(*keyword).rewrite(&current)? {
            Cow::Borrowed(_) => continue,
            Cow::Owned(rewritten) => rewritten,
        };
        current = Cow::Owned(next);
    }
    Ok(current)
}

fn parse_literal(literal: &[u8]) -> Result<Timestamp, TimestampParseError> {
    let text = std::str::from_utf8(literal).map_err(|e| TimestampParseError {
        literal: String::from_utf8_lossy(literal).into_owned(),
        reason: e.to_string(),
    })?;
    Timestamp::parse_rfc3339(text)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

fn find_byte(haystack: &[u8], byte: u8, from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .iter()
        .position(|b| *b == byte)
        .map(|at| at + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VALID_TS: &str = "2015-05-18T23:58:36.000Z";
    const TS_SECONDS: i64 = 1_431_993_516;

    fn structured() -> String {
        format!("{{\"seconds\": {TS_SECONDS}, \"nanos\": 0}}")
    }

    fn run(input: &str) -> (String, bool) {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let mut body = Bytes::from(input.to_string());
        let ok = rewriter.rewrite_body(&mut body).is_ok();
        (String::from_utf8(body.to_vec()).unwrap(), ok)
    }

    #[test]
    fn test_rewrite_table() {
        let s = structured();
        let cases: Vec<(String, String, bool)> = vec![
            // empty input
            (String::new(), String::new(), true),
            // basic
            (
                format!("\"creation_time\": \"{VALID_TS}\""),
                format!("\"creation_time\": {s}"),
                true,
            ),
            (
                format!("{{\"creation_time\": \"{VALID_TS}\"}}"),
                format!("{{\"creation_time\": {s}}}"),
                true,
            ),
            // nested
            (
                format!("{{\"signed_key\":{{\"key\": {{\"creation_time\": \"{VALID_TS}\"}}}}}}"),
                format!("{{\"signed_key\":{{\"key\": {{\"creation_time\": {s}}}}}}}"),
                true,
            ),
            // nothing to change
            (
                "nothing to be changed here".to_string(),
                "nothing to be changed here".to_string(),
                true,
            ),
            // two occurrences
            (
                format!("\"creation_time\": \"{VALID_TS}\", \"creation_time\": \"{VALID_TS}\""),
                format!("\"creation_time\": {s}, \"creation_time\": {s}"),
                true,
            ),
            // invalid and empty literals
            (
                "\"creation_time\": \"invalid\"".to_string(),
                "\"creation_time\": \"invalid\"".to_string(),
                false,
            ),
            (
                "\"creation_time\": \"\"".to_string(),
                "\"creation_time\": \"\"".to_string(),
                false,
            ),
            (
                "\"creation_time\": \"\", \"creation_time\": \"\"".to_string(),
                "\"creation_time\": \"\", \"creation_time\": \"\"".to_string(),
                false,
            ),
            // value missing its opening quote
            (
                "\"creation_time\": invalid\"".to_string(),
                "\"creation_time\": invalid\"".to_string(),
                true,
            ),
            // value missing its closing quote
            (
                "\"creation_time\": \"invalid".to_string(),
                "\"creation_time\": \"invalid".to_string(),
                true,
            ),
            // value missing both quotes
            (
                "\"creation_time\": invalid".to_string(),
                "\"creation_time\": invalid".to_string(),
                true,
            ),
            (
                format!("\"creation_time\": \"{VALID_TS}"),
                format!("\"creation_time\": \"{VALID_TS}"),
                true,
            ),
            // bare keyword
            (
                "creation_time: \"invalid\"".to_string(),
                "creation_time: \"invalid\"".to_string(),
                false,
            ),
            (
                format!("{{creation_time: \"{VALID_TS}\"}}"),
                format!("{{creation_time: {s}}}"),
                true,
            ),
            (
                format!("{{\"signed_key\":{{\"key\": {{creation_time: \"{VALID_TS}\"}}}}}}"),
                format!("{{\"signed_key\":{{\"key\": {{creation_time: {s}}}}}}}"),
                true,
            ),
            (
                format!("creation_time: \"{VALID_TS}\", \"creation_time\": \"{VALID_TS}\""),
                format!("creation_time: {s}, \"creation_time\": {s}"),
                true,
            ),
            // unquoted timestamp followed by more fields
            (
                format!(
                    "{{\"signed_key\":{{\"key\": {{\"creation_time\": {VALID_TS}, app_id: \"gmail\"}}}}}}"
                ),
                format!(
                    "{{\"signed_key\":{{\"key\": {{\"creation_time\": {VALID_TS}, app_id: \"gmail\"}}}}}}"
                ),
                true,
            ),
        ];

        for (input, want, want_ok) in cases {
            let (got, ok) = run(&input);
            assert_eq!(ok, want_ok, "error status for {input:?}");
            assert_eq!(got, want, "output for {input:?}");
        }
    }

    #[test]
    fn test_later_invalid_discards_earlier_substitutions() {
        let input = format!("\"creation_time\": \"{VALID_TS}\", \"creation_time\": \"nope\"");
        let (got, ok) = run(&input);
        assert!(!ok);
        assert_eq!(got, input);
    }

    #[test]
    fn test_error_names_keyword_and_offset() {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let err = rewriter.rewrite(b"{\"creation_time\": \"bogus\"}").unwrap_err();
        assert_eq!(err.keyword, CREATION_TIME);
        assert_eq!(err.offset, 19);
        assert_eq!(err.source.literal, "bogus");
    }

    #[test]
    fn test_rewrite_borrows_when_unchanged() {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let input = b"{\"app_id\": \"gmail\"}";
        assert!(matches!(rewriter.rewrite(input), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn test_rewrite_body_counts_substitutions() {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let mut body = Bytes::from(format!(
            "[{{\"creation_time\": \"{VALID_TS}\"}}, {{\"creation_time\": \"{VALID_TS}\"}}]"
        ));
        assert_eq!(rewriter.rewrite_body(&mut body), Ok(2));
        let decoded: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded[1]["creation_time"]["seconds"], TS_SECONDS);
    }

    #[test]
    fn test_fractional_seconds() {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let out = rewriter
            .rewrite(b"\"creation_time\": \"2015-05-18T23:58:36.123456789Z\"")
            .unwrap();
        assert_eq!(
            &*out,
            b"\"creation_time\": {\"seconds\": 1431993516, \"nanos\": 123456789}"
        );
    }

    #[test]
    fn test_non_utf8_literal_is_rejected() {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let input = b"\"creation_time\": \"\xff\xfe\"";
        assert!(rewriter.rewrite(input).is_err());
    }

    #[test]
    fn test_keyword_without_space_is_not_matched() {
        let rewriter = TimestampRewriter::new(CREATION_TIME);
        let input = b"{\"creation_time\":\"2015-05-18T23:58:36.000Z\"}";
        assert_eq!(&*rewriter.rewrite(input).unwrap(), &input[..]);
    }

    #[test]
    fn test_rewrite_all_applies_each_keyword() {
        let input = format!("{{\"time\": \"{VALID_TS}\", \"creation_time\": \"{VALID_TS}\"}}");
        let out = rewrite_all(input.as_bytes(), &[CREATION_TIME, "time"]).unwrap();
        let s = structured();
        assert_eq!(
            String::from_utf8(out.into_owned()).unwrap(),
            format!("{{\"time\": {s}, \"creation_time\": {s}}}")
        );
    }

    #[test]
    fn test_rewrite_all_stops_at_first_error() {
        let input = b"{\"creation_time\": \"x\", \"time\": \"2015-05-18T23:58:36Z\"}";
        let err = rewrite_all(input, &[CREATION_TIME, "time"]).unwrap_err();
        assert_eq!(err.keyword, CREATION_TIME);
    }

    #[test]
    fn test_empty_keyword_is_identity() {
        let rewriter = TimestampRewriter::new("");
        assert_eq!(&*rewriter.rewrite(b"\"\": \"x\"").unwrap(), b"\"\": \"x\"");
    }

    proptest! {
        #[test]
        fn rewrite_is_identity_without_keyword(input in "[ -~]{0,64}") {
            prop_assume!(!input.contains(CREATION_TIME));
            let rewriter = TimestampRewriter::new(CREATION_TIME);
            let out = rewriter.rewrite(input.as_bytes()).unwrap();
            prop_assert_eq!(&*out, input.as_bytes());
        }

        #[test]
        fn rewrite_preserves_surrounding_bytes(
            prefix in "[a-z{ ,]{0,16}",
            suffix in "[a-z} ,]{0,16}",
            seconds in 0i64..4_000_000_000,
        ) {
            let literal = Timestamp::new(seconds, 0).to_rfc3339().unwrap();
            let input = format!("{prefix}\"creation_time\": \"{literal}\"{suffix}");
            let out = TimestampRewriter::new(CREATION_TIME).rewrite(input.as_bytes()).unwrap();
            let want = format!(
                "{prefix}\"creation_time\": {{\"seconds\": {seconds}, \"nanos\": 0}}{suffix}"
            );
            prop_assert_eq!(String::from_utf8(out.into_owned()).unwrap(), want);
        }
    }
}
