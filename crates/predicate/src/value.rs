//! Runtime shape tags and value semantics over `serde_json::Value`.
//!
//! The observed value is always a `serde_json::Value`. This module adds the
//! two relations the matchers need on top of it: semantic equality (numbers
//! compared through [`crate::numeric`]) and a total order used by the
//! order-independent list equivalence.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::numeric;

/// Runtime shape of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum JsonType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    /// Returns the shape tag of `value`.
    pub fn of(value: &Value) -> JsonType {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Bool,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JsonType::Null => "Null",
            JsonType::Bool => "Bool",
            JsonType::Number => "Number",
            JsonType::String => "String",
            JsonType::Array => "Array",
            JsonType::Object => "Object",
        }
    }

    /// Whether `value` has this shape.
    pub fn matches(self, value: &Value) -> bool {
        JsonType::of(value) == self
    }

    /// Scalars are the shapes compared by plain membership.
    pub fn is_scalar(self) -> bool {
        matches!(self, JsonType::Bool | JsonType::Number | JsonType::String)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Semantic equality: structural, with numbers compared by value.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => numeric::numbers_equal(l, r),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(k, v)| r.get(k).is_some_and(|other| values_equal(v, other)))
        }
        (l, r) => l == r,
    }
}

/// Total order over JSON values.
///
/// Values of different shapes order by shape
/// (`Null < Bool < Number < String < Array < Object`). Arrays compare
/// lexicographically; objects compare as their key-sorted entry lists.
/// Consistent with [`values_equal`]: `compare_values(a, b) == Equal`
/// exactly when `values_equal(a, b)`.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Number(l), Value::Number(r)) => numeric::compare_numbers(l, r),
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Array(l), Value::Array(r)) => compare_sequences(l.iter(), r.iter()),
        (Value::Object(l), Value::Object(r)) => {
            let mut left_entries: Vec<_> = l.iter().collect();
            let mut right_entries: Vec<_> = r.iter().collect();
            left_entries.sort_by(|a, b| a.0.cmp(b.0));
            right_entries.sort_by(|a, b| a.0.cmp(b.0));
            for ((lk, lv), (rk, rv)) in left_entries.iter().zip(&right_entries) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            left_entries.len().cmp(&right_entries.len())
        }
        (l, r) => JsonType::of(l).cmp(&JsonType::of(r)),
    }
}

fn compare_sequences<'a>(
    left: impl Iterator<Item = &'a Value>,
    mut right: impl Iterator<Item = &'a Value>,
) -> Ordering {
    for l in left {
        match right.next() {
            None => return Ordering::Greater,
            Some(r) => {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
    if right.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Order-independent list equivalence: equal length, and equal once both
/// sides are sorted by [`compare_values`].
///
/// Elements of any shape are accepted because the order is total, but two
/// lists of objects are only equivalent if every object matches exactly;
/// use a list-matching predicate for looser element comparison.
pub fn lists_equivalent(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut sorted_left: Vec<&Value> = left.iter().collect();
    let mut sorted_right: Vec<&Value> = right.iter().collect();
    sorted_left.sort_by(|a, b| compare_values(a, b));
    sorted_right.sort_by(|a, b| compare_values(a, b));
    sorted_left
        .iter()
        .zip(&sorted_right)
        .all(|(a, b)| values_equal(a, b))
}

/// Membership under semantic equality.
pub fn list_contains(list: &[Value], elem: &Value) -> bool {
    list.iter().any(|member| values_equal(member, elem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags() {
        assert_eq!(JsonType::of(&json!(null)), JsonType::Null);
        assert_eq!(JsonType::of(&json!(true)), JsonType::Bool);
        assert_eq!(JsonType::of(&json!(1.5)), JsonType::Number);
        assert_eq!(JsonType::of(&json!("x")), JsonType::String);
        assert_eq!(JsonType::of(&json!([])), JsonType::Array);
        assert_eq!(JsonType::of(&json!({})), JsonType::Object);
        assert!(JsonType::Bool.is_scalar());
        assert!(!JsonType::Null.is_scalar());
        assert_eq!(JsonType::Object.to_string(), "Object");
    }

    #[test]
    fn nested_numbers_compare_semantically() {
        assert!(values_equal(
            &json!({"a": [1, {"b": 2.0}]}),
            &json!({"a": [1.0, {"b": 2}]})
        ));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn object_equality_ignores_key_order() {
        assert!(values_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn order_ranks_shapes() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(9), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!({}), &json!([])), Ordering::Greater);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Ordering::Greater);
        assert_eq!(
            compare_values(&json!({"b": 1, "a": 2}), &json!({"a": 2, "b": 1})),
            Ordering::Equal
        );
    }

    #[test]
    fn equivalence_ignores_order_but_not_length() {
        assert!(lists_equivalent(
            json!([1, 2, 3]).as_array().unwrap(),
            json!([3, 1, 2]).as_array().unwrap()
        ));
        assert!(!lists_equivalent(
            json!([1, 2]).as_array().unwrap(),
            json!([1, 2, 2]).as_array().unwrap()
        ));
        assert!(lists_equivalent(
            json!([{"k": 1}, "x", null]).as_array().unwrap(),
            json!([null, "x", {"k": 1.0}]).as_array().unwrap()
        ));
    }
}
