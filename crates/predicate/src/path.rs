//! Path strings locating a position inside a JSON value.
//!
//! `""` is the root, `name` an object field, `name/child` a nested field and
//! `[i]` an array index. Paths compose with `/`.

use serde::Serialize;
use serde_json::Value;

pub const PATH_SEPARATOR: char = '/';

/// A value together with the path it was found at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

impl PathValue {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        PathValue {
            path: path.into(),
            value,
        }
    }
}

/// Join two paths, treating an empty side as the identity.
pub fn join(base: &str, child: &str) -> String {
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}{}{}", base, PATH_SEPARATOR, child),
    }
}

/// Path segment for an array index.
pub fn index_segment(index: usize) -> String {
    format!("[{}]", index)
}

fn parse_index(segment: &str) -> Option<usize> {
    segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|s| s.parse().ok())
}

/// Locate the value at `path` inside `root`.
///
/// Returns `None` when a segment names a field or index that is absent, or
/// when it tries to descend into a scalar.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split(PATH_SEPARATOR)
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
            _ => None,
        })
}
