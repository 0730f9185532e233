//! Nested-path lookup over parsed JSON values.
//!
//! A path is a string of dot-separated segments where each segment may
//! carry bracketed array indexes, e.g. `a.b[0].c`. Dots inside
//! brackets are not treated as separators. Any missing key,
//! out-of-range index, or type mismatch resolves to `None` — this
//! function never fails. Used by the rate limiters and the pagination
//! cursor extraction.

use serde_json::Value;

/// Walk `data` along `path`, returning the addressed value if the
/// structure matches.
#[must_use]
pub fn resolve<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in split_segments(path) {
        let (key, indexes) = parse_segment(&segment)?;
        if key.is_empty() && indexes.is_empty() {
            return None;
        }
        if !key.is_empty() {
            current = current.as_object()?.get(key)?;
        }
        for idx in indexes {
            current = current.as_array()?.get(idx)?;
        }
    }
    Some(current)
}

/// [`resolve`] with a fallback value for any unmatched path.
#[must_use]
pub fn resolve_or<'a>(data: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    resolve(data, path).unwrap_or(default)
}

/// Split on dots outside brackets: `a.b[0].c` → `["a", "b[0]", "c"]`.
fn split_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;
    for ch in path.chars() {
        match ch {
            '[' => {
                depth += 1;
                buf.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                buf.push(ch);
            }
            '.' if depth == 0 => segments.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    segments.push(buf);
    segments
}

/// Split `key[1][2]` into `("key", [1, 2])`. `None` on malformed brackets.
fn parse_segment(segment: &str) -> Option<(&str, Vec<usize>)> {
    let (key, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };

    let mut indexes = Vec::new();
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = rest.find(']')?;
        let idx: usize = rest[1..close].parse().ok()?;
        indexes.push(idx);
        rest = &rest[close + 1..];
    }
    Some((key, indexes))
}
