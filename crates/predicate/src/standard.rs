//! Standard comparators bound to a runtime type.
//!
//! A factory carries a name, a comparison function and the type both sides
//! must have; binding an operand yields a [`StandardBinaryPredicate`].

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::binary::BinaryPredicate;
use crate::context::{ExecutionContext, Operand};
use crate::error::PredicateError;
use crate::numeric;
use crate::predicate::{same_predicate, ValuePredicate};
use crate::result::{PredicateLabel, PredicateResult, TypeMismatchError};
use crate::snapshot::SnapshotEntity;
use crate::value::{self, JsonType};

/// `(value, operand) -> bool`
pub type Comparison = fn(&Value, &Value) -> bool;

#[derive(Clone, Copy)]
pub struct StandardBinaryPredicateFactory {
    name: &'static str,
    comparison: Comparison,
    operand_type: Option<JsonType>,
}

impl StandardBinaryPredicateFactory {
    pub const fn new(
        name: &'static str,
        comparison: Comparison,
        operand_type: Option<JsonType>,
    ) -> Self {
        StandardBinaryPredicateFactory {
            name,
            comparison,
            operand_type,
        }
    }

    /// The name reported by predicates this factory builds.
    pub fn predicate_name(&self) -> &'static str {
        self.name
    }

    pub fn operand_type(&self) -> Option<JsonType> {
        self.operand_type
    }

    /// Bind an operand, producing a predicate.
    pub fn bind(
        &self,
        operand: impl Into<Operand>,
    ) -> Result<StandardBinaryPredicate, PredicateError> {
        Ok(StandardBinaryPredicate {
            base: BinaryPredicate::new(self.name, operand, self.operand_type)?,
            comparison: self.comparison,
        })
    }
}

impl fmt::Debug for StandardBinaryPredicateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardBinaryPredicateFactory")
            .field("name", &self.name)
            .field("operand_type", &self.operand_type)
            .finish_non_exhaustive()
    }
}

/// A binary predicate whose comparison is a plain boolean function.
#[derive(Clone)]
pub struct StandardBinaryPredicate {
    base: BinaryPredicate,
    comparison: Comparison,
}

impl StandardBinaryPredicate {
    pub fn base(&self) -> &BinaryPredicate {
        &self.base
    }
}

/// Function pointers are not compared; name, operand and type identify
/// the comparison.
impl PartialEq for StandardBinaryPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl fmt::Debug for StandardBinaryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardBinaryPredicate")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for StandardBinaryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for StandardBinaryPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let operand = self.base.resolve_operand(context)?;
        if let Some(expected) = self.base.operand_type() {
            if !expected.matches(value) {
                return Ok(TypeMismatchError::new(expected, JsonType::of(value), value).into());
            }
        }
        let valid = (self.comparison)(value, &operand);
        Ok(PredicateResult::comparison(
            PredicateLabel::of(self),
            value,
            valid,
        ))
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        self.base.export_snapshot("StandardBinaryPredicate")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}

// ──────────────────────────────────────────────
// Comparisons
// ──────────────────────────────────────────────

fn number_order(value: &Value, operand: &Value) -> Option<Ordering> {
    match (value, operand) {
        (Value::Number(v), Value::Number(o)) => Some(numeric::compare_numbers(v, o)),
        _ => None,
    }
}

fn num_le(value: &Value, operand: &Value) -> bool {
    number_order(value, operand).is_some_and(|o| o != Ordering::Greater)
}

fn num_ge(value: &Value, operand: &Value) -> bool {
    number_order(value, operand).is_some_and(|o| o != Ordering::Less)
}

fn equal(value: &Value, operand: &Value) -> bool {
    value::values_equal(value, operand)
}

fn not_equal(value: &Value, operand: &Value) -> bool {
    !value::values_equal(value, operand)
}

fn has_substring(value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::String(v), Value::String(o)) => v.contains(o.as_str()),
        _ => false,
    }
}

fn lists_similar(value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::Array(v), Value::Array(o)) => value::lists_equivalent(v, o),
        _ => false,
    }
}

pub const NUM_LE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("<=", num_le, Some(JsonType::Number));
pub const NUM_GE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new(">=", num_ge, Some(JsonType::Number));
pub const NUM_EQ: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("==", equal, Some(JsonType::Number));
pub const NUM_NE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("!=", not_equal, Some(JsonType::Number));

pub const STR_SUBSTR: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("has-substring", has_substring, Some(JsonType::String));
pub const STR_EQ: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("==", equal, Some(JsonType::String));
pub const STR_NE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("!=", not_equal, Some(JsonType::String));

pub const BOOL_EQ: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("==", equal, Some(JsonType::Bool));
pub const BOOL_NE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("!=", not_equal, Some(JsonType::Bool));

pub const DICT_EQ: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("==", equal, Some(JsonType::Object));
pub const DICT_NE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("!=", not_equal, Some(JsonType::Object));

pub const LIST_EQ: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("==", equal, Some(JsonType::Array));
pub const LIST_NE: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("!=", not_equal, Some(JsonType::Array));

/// Order-independent list equality (`~=`).
///
/// Both lists are sorted with the engine's total order before comparing,
/// so objects inside the lists must match exactly, field for field.
pub const LIST_SIMILAR: StandardBinaryPredicateFactory =
    StandardBinaryPredicateFactory::new("~=", lists_similar, Some(JsonType::Array));

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(factory: StandardBinaryPredicateFactory, operand: Value, value: Value) -> bool {
        factory
            .bind(operand)
            .unwrap()
            .evaluate(&ExecutionContext::new(), &value)
            .unwrap()
            .is_valid()
    }

    #[test]
    fn numeric_comparators() {
        assert!(check(NUM_LE, json!(10), json!(5)));
        assert!(check(NUM_LE, json!(10), json!(10.0)));
        assert!(!check(NUM_LE, json!(10), json!(11)));
        assert!(check(NUM_GE, json!(1.5), json!(2)));
        assert!(!check(NUM_GE, json!(1.5), json!(1.25)));
        assert!(check(NUM_EQ, json!(3), json!(3.0)));
        assert!(check(NUM_NE, json!(3), json!(4)));
    }

    #[test]
    fn string_comparators() {
        assert!(check(STR_SUBSTR, json!("ab"), json!("xaby")));
        assert!(!check(STR_SUBSTR, json!("ba"), json!("xaby")));
        assert!(check(STR_SUBSTR, json!(""), json!("anything")));
        assert!(check(STR_EQ, json!("a"), json!("a")));
        assert!(check(STR_NE, json!("a"), json!("b")));
    }

    #[test]
    fn container_comparators() {
        assert!(check(DICT_EQ, json!({"a": 1, "b": [1]}), json!({"b": [1], "a": 1})));
        assert!(check(DICT_NE, json!({"a": 1}), json!({"a": 2})));
        assert!(check(LIST_EQ, json!([1, 2]), json!([1, 2])));
        assert!(!check(LIST_EQ, json!([1, 2]), json!([2, 1])));
        assert!(check(LIST_NE, json!([1, 2]), json!([2, 1])));
    }

    #[test]
    fn list_similar_is_order_independent_and_commutative() {
        assert!(check(LIST_SIMILAR, json!([1, 2, 3]), json!([3, 1, 2])));
        assert!(check(LIST_SIMILAR, json!([3, 1, 2]), json!([1, 2, 3])));
        assert!(!check(LIST_SIMILAR, json!([1, 2]), json!([1, 2, 2])));
        assert!(!check(LIST_SIMILAR, json!([1, 2, 2]), json!([1, 2])));
    }

    #[test]
    fn value_of_wrong_type_is_a_mismatch_result() {
        let result = NUM_EQ
            .bind(json!(1))
            .unwrap()
            .evaluate(&ExecutionContext::new(), &json!("1"))
            .unwrap();
        match result {
            PredicateResult::TypeMismatch(e) => {
                assert_eq!(e.expected, JsonType::Number);
                assert_eq!(e.actual, JsonType::String);
                assert_eq!(e.location.path_value.value, json!("1"));
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn operand_of_wrong_type_is_fatal() {
        assert!(matches!(
            STR_SUBSTR.bind(json!(5)),
            Err(PredicateError::OperandType { .. })
        ));
        let deferred = NUM_GE.bind(Operand::binding("MIN")).unwrap();
        let ctx = ExecutionContext::new().with_binding("MIN", json!("zero"));
        assert!(deferred.evaluate(&ctx, &json!(1)).is_err());
    }

    #[test]
    fn deferred_operand_resolves_per_evaluation() {
        let pred = NUM_LE.bind(Operand::binding("MAX")).unwrap();
        let small = ExecutionContext::new().with_binding("MAX", json!(1));
        let large = ExecutionContext::new().with_binding("MAX", json!(100));
        assert!(!pred.evaluate(&small, &json!(5)).unwrap().is_valid());
        assert!(pred.evaluate(&large, &json!(5)).unwrap().is_valid());
    }

    #[test]
    fn predicates_from_same_factory_compare_by_value() {
        let a = STR_EQ.bind("x").unwrap();
        let b = STR_EQ.bind("x").unwrap();
        assert_eq!(a, b);
        assert!(a.eq_predicate(&b));
        assert_ne!(a, STR_NE.bind("x").unwrap());
        assert_ne!(a, STR_EQ.bind("y").unwrap());
        // Same name and operand but a different type constraint.
        assert!(!NUM_EQ.bind(json!(1)).unwrap().eq_predicate(&LIST_EQ.bind(json!([1])).unwrap()));
    }

    #[test]
    fn result_records_producing_predicate() {
        let result = STR_EQ
            .bind("x")
            .unwrap()
            .evaluate(&ExecutionContext::new(), &json!("x"))
            .unwrap();
        let label = result.predicate().unwrap();
        assert_eq!(label.name, "==");
        assert_eq!(label.display, "==(\"x\")->String");
        assert_eq!(result.target_path(), "");
    }
}
