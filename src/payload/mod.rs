//! Explicit path probing over loosely shaped provider payloads.
//!
//! Extractors describe every known location of a value as a `PayloadPath`
//! and try them in order. Nothing here scans a payload for "anything that
//! looks like a URL"; a location is either listed or it is not read.

use std::borrow::Cow;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member.
    Key(&'static str),
    /// Array element.
    Index(usize),
    /// Parses a JSON-encoded string in place; non-string values pass through.
    Decode,
}

pub type PayloadPath = &'static [PathSegment];

/// Builds a `PayloadPath`: string literals are keys, `[n]` is an index and
/// `decode` parses a JSON-encoded string.
macro_rules! json_path {
    (@segment [$index:literal]) => {
        $crate::payload::PathSegment::Index($index)
    };
    (@segment decode) => {
        $crate::payload::PathSegment::Decode
    };
    (@segment $key:literal) => {
        $crate::payload::PathSegment::Key($key)
    };
    ($($segment:tt)*) => {
        &[$(json_path!(@segment $segment)),*]
    };
}

pub(crate) use json_path;

pub fn lookup<'a>(root: &'a Value, path: &[PathSegment]) -> Option<Cow<'a, Value>> {
    let mut current = Cow::Borrowed(root);
    for segment in path {
        current = step(current, *segment)?;
    }
    Some(current)
}

fn step(current: Cow<'_, Value>, segment: PathSegment) -> Option<Cow<'_, Value>> {
    match segment {
        PathSegment::Decode => {
            if let Value::String(text) = current.as_ref() {
                return serde_json::from_str::<Value>(text.trim())
                    .ok()
                    .map(Cow::Owned);
            }
            Some(current)
        }
        PathSegment::Key(key) => match current {
            Cow::Borrowed(value) => value.get(key).map(Cow::Borrowed),
            Cow::Owned(mut value) => value.get_mut(key).map(Value::take).map(Cow::Owned),
        },
        PathSegment::Index(index) => match current {
            Cow::Borrowed(value) => value.get(index).map(Cow::Borrowed),
            Cow::Owned(mut value) => value.get_mut(index).map(Value::take).map(Cow::Owned),
        },
    }
}

/// Non-empty, trimmed string at `path`. Numbers are rendered as text so
/// numeric identifiers survive.
pub fn text_at(root: &Value, path: &[PathSegment]) -> Option<String> {
    match lookup(root, path)?.as_ref() {
        Value::String(text) => non_empty(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// First non-empty string found along `paths`, in order.
pub fn first_text(root: &Value, paths: &[PayloadPath]) -> Option<String> {
    paths.iter().find_map(|path| text_at(root, path))
}

/// First non-empty string value (numbers excluded) along `paths`.
pub fn first_url(root: &Value, paths: &[PayloadPath]) -> Option<String> {
    paths.iter().find_map(|path| match lookup(root, path)?.as_ref() {
        Value::String(text) => non_empty(text),
        _ => None,
    })
}

/// Integer at `path`; accepts JSON numbers and numeric strings such as `"1"`.
pub fn integer_at(root: &Value, path: &[PathSegment]) -> Option<i64> {
    match lookup(root, path)?.as_ref() {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Lower-cased, trimmed status word at the first matching path.
pub fn status_word(root: &Value, paths: &[PayloadPath]) -> Option<String> {
    paths.iter().find_map(|path| match lookup(root, path)?.as_ref() {
        Value::String(text) => non_empty(text).map(|word| word.to_ascii_lowercase()),
        _ => None,
    })
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed.to_string())
    }
}
