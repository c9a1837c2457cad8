//! Positional path component extraction.
//!
//! Routes name identifiers by their segment index rather than by a
//! placeholder name: in `/v1/users/{user_id}/keys/{key_id}` the user id is
//! segment 2 and the key id is segment 4.

use std::borrow::Cow;

use crate::PathError;

/// Splits a URL path into segments, dropping the leading `/`.
///
/// ```rust
/// use keyrest_codec::path_segments;
///
/// assert_eq!(path_segments("/v1/users/a@b.com"), vec!["v1", "users", "a@b.com"]);
/// assert!(path_segments("/").is_empty());
/// ```
#[must_use]
pub fn path_segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Returns the segment at `index`.
///
/// Fails with [`PathError::IndexOutOfRange`] when `index` is negative or not
/// smaller than the number of segments.
///
/// ```rust
/// use keyrest_codec::extract;
///
/// let segments = ["v1", "users", "a@b.com"];
/// assert_eq!(extract(&segments, 2), Ok("a@b.com"));
/// assert!(extract(&segments, 5).is_err());
/// assert!(extract(&segments, -1).is_err());
/// ```
pub fn extract<'a>(segments: &[&'a str], index: isize) -> Result<&'a str, PathError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| segments.get(i))
        .copied()
        .ok_or(PathError::IndexOutOfRange {
            index,
            len: segments.len(),
        })
}

/// Like [`extract`], then percent-decodes the segment.
pub fn extract_decoded<'a>(segments: &[&'a str], index: isize) -> Result<Cow<'a, str>, PathError> {
    let segment = extract(segments, index)?;
    urlencoding::decode(segment).map_err(|_| PathError::InvalidEncoding {
        segment: segment.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EMAIL: &str = "e2eshare.test@gmail.com";

    #[test]
    fn test_extract_table() {
        let cases: [(&[&str], isize, Option<&str>); 4] = [
            (&["v1", "users", EMAIL], 2, Some(EMAIL)),
            (&["v1", "users", "e2eshare.test@cs.ox.ac.uk"], -1, None),
            (&["v1", "users", "e2eshare.test@cs.ox.ac.uk"], 3, None),
            (&[], 0, None),
        ];

        for (segments, index, want) in cases {
            let got = extract(segments, index).ok();
            assert_eq!(got, want, "extract({segments:?}, {index})");
        }
    }

    #[test]
    fn test_extract_error_reports_bounds() {
        let err = extract(&["v1", "users"], 7).unwrap_err();
        assert_eq!(err, PathError::IndexOutOfRange { index: 7, len: 2 });
    }

    #[test]
    fn test_path_segments_keys_route() {
        let segments = path_segments("/v1/users/alice@example.com/keys/mykey");
        assert_eq!(segments, vec!["v1", "users", "alice@example.com", "keys", "mykey"]);
        assert_eq!(extract(&segments, 4), Ok("mykey"));
    }

    #[test]
    fn test_path_segments_keeps_trailing_empty_segment() {
        assert_eq!(path_segments("/v1/users/"), vec!["v1", "users", ""]);
    }

    #[test]
    fn test_extract_decoded() {
        let segments = path_segments("/v1/users/alice%40example.com");
        assert_eq!(extract_decoded(&segments, 2).unwrap(), "alice@example.com");

        let bad = ["%FF%FE"];
        assert!(matches!(
            extract_decoded(&bad, 0),
            Err(PathError::InvalidEncoding { .. })
        ));
    }

    proptest! {
        #[test]
        fn extract_succeeds_iff_in_range(
            segments in proptest::collection::vec("[a-z0-9@.]{0,8}", 0..6),
            index in -3isize..8,
        ) {
            let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
            let in_range = index >= 0 && (index as usize) < refs.len();
            match extract(&refs, index) {
                Ok(value) => {
                    prop_assert!(in_range);
                    prop_assert_eq!(value, refs[index as usize]);
                }
                Err(_) => prop_assert!(!in_range),
            }
        }
    }
}
