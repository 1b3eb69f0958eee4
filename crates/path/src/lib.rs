//! Slash-delimited path utilities for echo trees.
//!
//! A path addresses a descendant of a node: each segment is either a
//! compound key or a list index, joined with `/`. The root path is the empty
//! string and is never prefixed with `/`. Inside a segment `~` is written as
//! `~0` and `/` as `~1`, so any compound key can be addressed.
//!
//! # Example
//!
//! ```
//! use echo_path::{format_path, join_path, parse_path};
//!
//! let segments = parse_path("items/0/a~1b");
//! assert_eq!(segments, vec!["items", "0", "a/b"]);
//! assert_eq!(format_path(&segments), "items/0/a~1b");
//! assert_eq!(join_path("", "items"), "items");
//! assert_eq!(join_path("items", "x/y"), "items/x~1y");
//! ```

/// Segment separator.
pub const SEPARATOR: char = '/';

/// Escapes `~` and `/` inside one segment.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains(['~', SEPARATOR]) {
        return segment.to_string();
    }
    segment.replace('~', "~0").replace(SEPARATOR, "~1")
}

/// Reverses [`escape_segment`].
pub fn unescape_segment(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace("~1", "/").replace("~0", "~")
}

/// Splits a path into its unescaped segments.
///
/// Empty segments are dropped, so a blank path, `"/"` and `"a//b"` behave
/// like `""`, `""` and `"a/b"`.
pub fn parse_path(path: &str) -> Vec<String> {
    path.split(SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .map(unescape_segment)
        .collect()
}

/// Joins raw segments with `/`, escaping each one.
pub fn format_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(&escape_segment(segment.as_ref()));
    }
    out
}

/// Appends one raw segment to a path. Joining onto the root yields the bare
/// (escaped) segment.
pub fn join_path(path: &str, segment: &str) -> String {
    let segment = escape_segment(segment);
    if path.is_empty() {
        return segment;
    }
    let mut out = String::with_capacity(path.len() + 1 + segment.len());
    out.push_str(path);
    out.push(SEPARATOR);
    out.push_str(&segment);
    out
}

/// Splits a path into its parent path and last raw segment. `None` for the
/// root.
pub fn split_parent(path: &str) -> Option<(String, String)> {
    let mut segments = parse_path(path);
    let last = segments.pop()?;
    Some((format_path(&segments), last))
}

/// Interprets a segment as a non-negative list index.
///
/// Leading `+` signs and whitespace are not accepted.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
