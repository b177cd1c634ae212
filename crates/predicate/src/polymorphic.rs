//! Predicates that pick their comparison from the runtime type of the value.

use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::binary::BinaryPredicate;
use crate::context::{ExecutionContext, Operand};
use crate::error::PredicateError;
use crate::path;
use crate::predicate::{same_predicate, ValuePredicate};
use crate::result::{PredicateLabel, PredicateResult, TypeMismatchError};
use crate::snapshot::SnapshotEntity;
use crate::standard::{
    StandardBinaryPredicateFactory, BOOL_EQ, BOOL_NE, DICT_EQ, DICT_NE, LIST_NE, LIST_SIMILAR,
    NUM_EQ, NUM_NE, STR_EQ, STR_NE, STR_SUBSTR,
};
use crate::subset::{DictSubsetPredicate, ListSubsetPredicate};
use crate::value::JsonType;

/// Whether an element of type `elem` could contain an operand of type
/// `operand` when searching inside a list.
fn may_contain(elem: JsonType, operand: JsonType) -> bool {
    match elem {
        JsonType::Array => true,
        JsonType::Null => false,
        other => other == operand,
    }
}

/// Type-driven containment.
///
/// | value  | meaning                                                       |
/// |--------|---------------------------------------------------------------|
/// | String | operand is a substring                                        |
/// | Object | operand is a subset                                           |
/// | Number | equal                                                         |
/// | Bool   | equal                                                         |
/// | Array  | list operand: subset; otherwise some element contains operand |
#[derive(Debug, Clone, PartialEq)]
pub struct ContainsPredicate {
    base: BinaryPredicate,
}

impl ContainsPredicate {
    pub fn new(operand: impl Into<Operand>) -> Self {
        ContainsPredicate {
            base: BinaryPredicate::unconstrained("Contains", operand),
        }
    }

    pub fn base(&self) -> &BinaryPredicate {
        &self.base
    }

    fn contains(
        &self,
        context: &ExecutionContext,
        operand: &Value,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        match value {
            Value::String(_) => bind_and_evaluate(STR_SUBSTR, operand, context, value),
            Value::Number(_) => bind_and_evaluate(NUM_EQ, operand, context, value),
            Value::Bool(_) => bind_and_evaluate(BOOL_EQ, operand, context, value),
            Value::Object(_) => match operand {
                Value::Object(_) => DictSubsetPredicate::new(operand.clone())?.evaluate(context, value),
                other => Ok(TypeMismatchError::new(JsonType::Object, JsonType::of(other), value).into()),
            },
            Value::Array(items) => {
                if operand.is_array() {
                    return ListSubsetPredicate::new(operand.clone(), false)?.evaluate(context, value);
                }
                let operand_type = JsonType::of(operand);
                let mut bad_values = Vec::new();
                for (index, elem) in items.iter().enumerate() {
                    if may_contain(JsonType::of(elem), operand_type) {
                        let result = self.contains(context, operand, elem)?;
                        if result.is_valid() {
                            let segment = path::index_segment(index);
                            return Ok(result.clone_with_source(value, &segment, &segment));
                        }
                    }
                    bad_values.push(elem.clone());
                }
                tracing::debug!(operand = %operand, candidates = bad_values.len(), "no element contains operand");
                Ok(PredicateResult::comparison(
                    PredicateLabel::of(self),
                    &Value::Array(bad_values),
                    false,
                ))
            }
            Value::Null => Err(PredicateError::UnsupportedValue {
                predicate: self.base.name().to_string(),
                actual: JsonType::Null,
            }),
        }
    }
}

/// Bind `operand` to `factory` and evaluate, turning an operand of the
/// wrong type into a mismatch result instead of a construction error.
fn bind_and_evaluate(
    factory: StandardBinaryPredicateFactory,
    operand: &Value,
    context: &ExecutionContext,
    value: &Value,
) -> Result<PredicateResult, PredicateError> {
    match factory.operand_type() {
        Some(expected) if !expected.matches(operand) => {
            Ok(TypeMismatchError::new(expected, JsonType::of(operand), value).into())
        }
        _ => factory.bind(operand.clone())?.evaluate(context, value),
    }
}

impl fmt::Display for ContainsPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for ContainsPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let operand = self.base.resolve_operand(context)?;
        self.contains(context, &operand, value)
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        self.base.export_snapshot("ContainsPredicate")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}

/// Equality or inequality, dispatched on the value's type.
fn typed_comparison(
    name: &str,
    pick: fn(JsonType) -> Option<StandardBinaryPredicateFactory>,
    context: &ExecutionContext,
    operand: &Value,
    value: &Value,
) -> Result<PredicateResult, PredicateError> {
    let value_type = JsonType::of(value);
    let Some(factory) = pick(value_type) else {
        return Err(PredicateError::UnsupportedValue {
            predicate: name.to_string(),
            actual: value_type,
        });
    };
    let operand_type = JsonType::of(operand);
    if value_type != operand_type {
        return Ok(TypeMismatchError::new(value_type, operand_type, value).into());
    }
    factory.bind(operand.clone())?.evaluate(context, value)
}

fn equivalent_factory(value_type: JsonType) -> Option<StandardBinaryPredicateFactory> {
    match value_type {
        JsonType::String => Some(STR_EQ),
        JsonType::Number => Some(NUM_EQ),
        JsonType::Bool => Some(BOOL_EQ),
        JsonType::Object => Some(DICT_EQ),
        JsonType::Array => Some(LIST_SIMILAR),
        JsonType::Null => None,
    }
}

fn different_factory(value_type: JsonType) -> Option<StandardBinaryPredicateFactory> {
    match value_type {
        JsonType::String => Some(STR_NE),
        JsonType::Number => Some(NUM_NE),
        JsonType::Bool => Some(BOOL_NE),
        JsonType::Object => Some(DICT_NE),
        JsonType::Array => Some(LIST_NE),
        JsonType::Null => None,
    }
}

/// Type-driven equality. Lists compare without regard to order.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalentPredicate {
    base: BinaryPredicate,
}

impl EquivalentPredicate {
    pub fn new(operand: impl Into<Operand>) -> Self {
        EquivalentPredicate {
            base: BinaryPredicate::unconstrained("Equivalent", operand),
        }
    }
}

impl fmt::Display for EquivalentPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for EquivalentPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let operand = self.base.resolve_operand(context)?;
        typed_comparison(self.base.name(), equivalent_factory, context, &operand, value)
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        self.base.export_snapshot("EquivalentPredicate")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}

/// Type-driven inequality. Lists compare in order.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentPredicate {
    base: BinaryPredicate,
}

impl DifferentPredicate {
    pub fn new(operand: impl Into<Operand>) -> Self {
        DifferentPredicate {
            base: BinaryPredicate::unconstrained("Different", operand),
        }
    }
}

impl fmt::Display for DifferentPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for DifferentPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let operand = self.base.resolve_operand(context)?;
        typed_comparison(self.base.name(), different_factory, context, &operand, value)
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        self.base.export_snapshot("DifferentPredicate")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contains(operand: Value, value: Value) -> PredicateResult {
        ContainsPredicate::new(operand)
            .evaluate(&ExecutionContext::new(), &value)
            .unwrap()
    }

    #[test]
    fn contains_dispatch_matrix() {
        assert!(contains(json!("ell"), json!("hello")).is_valid());
        assert!(!contains(json!("xyz"), json!("hello")).is_valid());
        assert!(contains(json!({"a": 1}), json!({"a": 1, "b": 2})).is_valid());
        assert!(!contains(json!({"a": 2}), json!({"a": 1, "b": 2})).is_valid());
        assert!(contains(json!(3), json!(3.0)).is_valid());
        assert!(!contains(json!(3), json!(4)).is_valid());
        assert!(contains(json!(true), json!(true)).is_valid());
        assert!(contains(json!([1, 3]), json!([1, 2, 3])).is_valid());
        assert!(!contains(json!([1, 4]), json!([1, 2, 3])).is_valid());
    }

    #[test]
    fn contains_searches_list_elements() {
        assert!(contains(json!("ell"), json!([1, "hello", null])).is_valid());
        assert!(contains(json!({"k": 1}), json!(["x", {"k": 1, "j": 2}])).is_valid());
        assert!(contains(json!(2), json!([[1, 2], "2"])).is_valid());
        assert!(contains(json!("b"), json!([["a", "abc"]])).is_valid());
    }

    #[test]
    fn contains_hit_reports_matching_element() {
        let value = json!(["abc", 5, "xyz"]);
        let result = contains(json!("y"), value.clone());
        assert!(result.is_valid());
        assert_eq!(result.target_path(), "[2]");
        assert_eq!(result.source(), &value);
        assert_eq!(result.path_value().value, json!("xyz"));

        let nested = json!([7, [1, 2]]);
        let result = contains(json!(2), nested.clone());
        assert!(result.is_valid());
        assert_eq!(result.target_path(), "[1]/[1]");
        assert_eq!(result.source(), &nested);
    }

    #[test]
    fn contains_failure_lists_rejected_elements() {
        let result = contains(json!("zz"), json!(["abc", 5, "def"]));
        assert!(!result.is_valid());
        assert_eq!(result.path_value().value, json!(["abc", 5, "def"]));
        assert_eq!(result.predicate().unwrap().name, "Contains");
    }

    #[test]
    fn contains_type_mismatches_are_results() {
        assert_eq!(contains(json!(1), json!("one")).kind(), "type_mismatch");
        assert_eq!(contains(json!("a"), json!({"a": 1})).kind(), "type_mismatch");
        assert_eq!(contains(json!("1"), json!(1)).kind(), "type_mismatch");
    }

    #[test]
    fn contains_null_value_is_fatal() {
        let err = ContainsPredicate::new(json!(1))
            .evaluate(&ExecutionContext::new(), &Value::Null)
            .unwrap_err();
        assert_eq!(
            err,
            PredicateError::UnsupportedValue {
                predicate: "Contains".to_string(),
                actual: JsonType::Null,
            }
        );
    }

    #[test]
    fn contains_with_deferred_operand() {
        let pred = ContainsPredicate::new(Operand::binding("NEEDLE"));
        let ctx = ExecutionContext::new().with_binding("NEEDLE", json!("web"));
        assert!(pred.evaluate(&ctx, &json!("web-1")).unwrap().is_valid());
        assert!(pred.evaluate(&ExecutionContext::new(), &json!("web-1")).is_err());
    }

    #[test]
    fn equivalent_dispatch() {
        let ctx = ExecutionContext::new();
        let eq = |operand: Value, value: Value| {
            EquivalentPredicate::new(operand)
                .evaluate(&ctx, &value)
                .unwrap()
        };
        assert!(eq(json!("a"), json!("a")).is_valid());
        assert!(eq(json!(1), json!(1.0)).is_valid());
        assert!(eq(json!(false), json!(false)).is_valid());
        assert!(eq(json!({"a": [1]}), json!({"a": [1]})).is_valid());
        assert!(eq(json!([1, 2, 3]), json!([3, 2, 1])).is_valid());
        assert!(!eq(json!([1, 2]), json!([1, 2, 2])).is_valid());
        assert!(!eq(json!({"a": 1}), json!({"a": 1, "b": 2})).is_valid());

        match eq(json!("1"), json!(1)) {
            PredicateResult::TypeMismatch(e) => {
                assert_eq!(e.expected, JsonType::Number);
                assert_eq!(e.actual, JsonType::String);
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn different_dispatch() {
        let ctx = ExecutionContext::new();
        let ne = |operand: Value, value: Value| {
            DifferentPredicate::new(operand)
                .evaluate(&ctx, &value)
                .unwrap()
        };
        assert!(ne(json!("a"), json!("b")).is_valid());
        assert!(!ne(json!(2), json!(2)).is_valid());
        assert!(ne(json!([1, 2]), json!([2, 1])).is_valid());
        assert!(ne(json!(true), json!(false)).is_valid());
        assert_eq!(ne(json!([1]), json!({"a": 1})).kind(), "type_mismatch");
    }

    #[test]
    fn null_is_unsupported_for_equality() {
        let ctx = ExecutionContext::new();
        let err = EquivalentPredicate::new(Value::Null)
            .evaluate(&ctx, &Value::Null)
            .unwrap_err();
        assert!(matches!(err, PredicateError::UnsupportedValue { .. }));

        let err = EquivalentPredicate::new(json!(1))
            .evaluate(&ctx, &Value::Null)
            .unwrap_err();
        assert_eq!(
            err,
            PredicateError::UnsupportedValue {
                predicate: "Equivalent".to_string(),
                actual: JsonType::Null,
            }
        );
        let err = DifferentPredicate::new("x")
            .evaluate(&ctx, &Value::Null)
            .unwrap_err();
        assert_eq!(
            err,
            PredicateError::UnsupportedValue {
                predicate: "Different".to_string(),
                actual: JsonType::Null,
            }
        );
    }

    #[test]
    fn null_operand_on_supported_value_is_mismatch() {
        let result = EquivalentPredicate::new(Value::Null)
            .evaluate(&ExecutionContext::new(), &json!(1))
            .unwrap();
        assert_eq!(result.kind(), "type_mismatch");
    }

    #[test]
    fn display_and_equality() {
        assert_eq!(ContainsPredicate::new("x").to_string(), "Contains(\"x\")->Any");
        assert_eq!(EquivalentPredicate::new(json!(1)), EquivalentPredicate::new(json!(1)));
        assert!(!EquivalentPredicate::new(json!(1)).eq_predicate(&DifferentPredicate::new(json!(1))));
    }
}
