//! Subset and membership matching.
//!
//! Subset matching tolerates extra content in the observed value: every
//! field (or element) of the expectation must be present and compatible,
//! anything else is ignored.

use std::any::Any;
use std::fmt;

use serde_json::{Map, Value};

use crate::binary::BinaryPredicate;
use crate::context::{ExecutionContext, Operand};
use crate::error::PredicateError;
use crate::path::{self, PathValue};
use crate::polymorphic::{ContainsPredicate, EquivalentPredicate};
use crate::predicate::{same_predicate, ValuePredicate};
use crate::result::{
    MissingPathError, PathValueResult, PredicateLabel, PredicateResult, ResultLocation,
    TypeMismatchError,
};
use crate::snapshot::SnapshotEntity;
use crate::standard::{NUM_EQ, STR_EQ};
use crate::value::{self, JsonType};

// ──────────────────────────────────────────────
// Objects
// ──────────────────────────────────────────────

/// The operand object must be a (recursive) subset of the value.
///
/// Fields are checked in the operand's declaration order and the first
/// failing field is reported; later fields are not examined.
#[derive(Debug, Clone, PartialEq)]
pub struct DictSubsetPredicate {
    base: BinaryPredicate,
}

impl DictSubsetPredicate {
    pub fn new(operand: impl Into<Operand>) -> Result<Self, PredicateError> {
        Ok(DictSubsetPredicate {
            base: BinaryPredicate::new("has-subset", operand, Some(JsonType::Object))?,
        })
    }

    pub fn base(&self) -> &BinaryPredicate {
        &self.base
    }

    /// Whether `a` is a subset of `b`, where `b` sits at `path` in `source`.
    fn is_subset(
        &self,
        context: &ExecutionContext,
        source: &Value,
        path: &str,
        a: &Map<String, Value>,
        b: &Map<String, Value>,
    ) -> Result<PredicateResult, PredicateError> {
        for (name, a_value) in a {
            let namepath = path::join(path, name);
            let Some(b_value) = b.get(name) else {
                tracing::debug!(path = %namepath, "subset field missing from value");
                return Ok(MissingPathError {
                    location: ResultLocation::new(
                        source,
                        namepath,
                        PathValue::new(path, Value::Object(b.clone())),
                    ),
                }
                .into());
            };

            match b_value {
                Value::Object(b_map) => {
                    let Value::Object(a_map) = a_value else {
                        return Ok(TypeMismatchError::at(
                            JsonType::Object,
                            JsonType::of(a_value),
                            ResultLocation::new(
                                source,
                                namepath.clone(),
                                PathValue::new(namepath, b_value.clone()),
                            ),
                        )
                        .into());
                    };
                    let result = self.is_subset(context, source, &namepath, a_map, b_map)?;
                    if !result.is_valid() {
                        return Ok(result);
                    }
                }
                Value::Array(_) => {
                    let result = if a_value.is_array() {
                        ListSubsetPredicate::new(a_value.clone(), false)?.evaluate(context, b_value)?
                    } else {
                        ContainsPredicate::new(a_value.clone()).evaluate(context, b_value)?
                    };
                    if !result.is_valid() {
                        tracing::debug!(path = %namepath, "subset list field did not match");
                        return Ok(result.clone_with_source(source, &namepath, &namepath));
                    }
                }
                _ => {
                    if !value::values_equal(a_value, b_value) {
                        tracing::debug!(path = %namepath, "subset scalar field differs");
                        return scalar_mismatch(source, &namepath, a_value, b_value);
                    }
                }
            }
        }

        Ok(PredicateResult::PathValue(PathValueResult {
            predicate: PredicateLabel::of(self),
            location: ResultLocation::new(
                source,
                path,
                PathValue::new(path, Value::Object(b.clone())),
            ),
            valid: true,
        }))
    }
}

/// Failure for a scalar field that differs from the expectation, labeled
/// with the equality predicate that applies to the observed type.
fn scalar_mismatch(
    source: &Value,
    namepath: &str,
    expected: &Value,
    observed: &Value,
) -> Result<PredicateResult, PredicateError> {
    let location = ResultLocation::new(
        source,
        namepath,
        PathValue::new(namepath, observed.clone()),
    );
    let confirm_type = match observed {
        Value::String(_) => Some(JsonType::String),
        Value::Number(_) => Some(JsonType::Number),
        _ => None,
    };
    if let Some(confirm) = confirm_type {
        if !confirm.matches(expected) {
            return Ok(TypeMismatchError::at(confirm, JsonType::of(expected), location).into());
        }
    }
    let predicate = match confirm_type {
        Some(JsonType::String) => PredicateLabel::of(&STR_EQ.bind(expected.clone())?),
        Some(JsonType::Number) => PredicateLabel::of(&NUM_EQ.bind(expected.clone())?),
        _ => PredicateLabel::of(&EquivalentPredicate::new(expected.clone())),
    };
    Ok(PredicateResult::PathValue(PathValueResult {
        predicate,
        location,
        valid: false,
    }))
}

impl fmt::Display for DictSubsetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for DictSubsetPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let Value::Object(b) = value else {
            return Ok(TypeMismatchError::new(JsonType::Object, JsonType::of(value), value).into());
        };
        let operand = self.base.resolve_operand(context)?;
        let Value::Object(a) = &operand else {
            // resolve_operand already enforced the Object constraint.
            return Err(PredicateError::OperandType {
                predicate: self.base.name().to_string(),
                expected: JsonType::Object,
                actual: JsonType::of(&operand),
            });
        };
        self.is_subset(context, value, "", a, b)
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        self.base.export_snapshot("DictSubsetPredicate")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}

// ──────────────────────────────────────────────
// Lists
// ──────────────────────────────────────────────

/// Whether `elem` belongs to `list`.
///
/// Scalars (and everything, when `strict`) must appear literally. Objects
/// and lists, when not strict, need only be a structural subset of some
/// member.
fn verify_elem(
    name: &str,
    strict: bool,
    context: &ExecutionContext,
    elem: &Value,
    list: &[Value],
) -> Result<bool, PredicateError> {
    let elem_type = JsonType::of(elem);
    if strict || elem_type.is_scalar() {
        return Ok(value::list_contains(list, elem));
    }

    let pred: Box<dyn ValuePredicate> = match elem {
        Value::Array(_) => Box::new(ListSubsetPredicate::new(elem.clone(), false)?),
        Value::Object(_) => Box::new(DictSubsetPredicate::new(elem.clone())?),
        _ => {
            return Err(PredicateError::UnsupportedValue {
                predicate: name.to_string(),
                actual: elem_type,
            })
        }
    };
    for member in list {
        if pred.evaluate(context, member)?.is_valid() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Every element of the operand list must be a member of the value list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSubsetPredicate {
    base: BinaryPredicate,
    strict: bool,
}

impl ListSubsetPredicate {
    pub fn new(operand: impl Into<Operand>, strict: bool) -> Result<Self, PredicateError> {
        Ok(ListSubsetPredicate {
            base: BinaryPredicate::new("has-subset", operand, Some(JsonType::Array))?,
            strict,
        })
    }

    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl fmt::Display for ListSubsetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for ListSubsetPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let Value::Array(list) = value else {
            return Ok(TypeMismatchError::new(JsonType::Array, JsonType::of(value), value).into());
        };
        let operand = self.base.resolve_operand(context)?;
        let elems = operand.as_array().map(Vec::as_slice).unwrap_or_default();
        for (index, elem) in elems.iter().enumerate() {
            if !verify_elem(self.base.name(), self.strict, context, elem, list)? {
                tracing::debug!(index, element = %elem, "list subset element not found");
                return Ok(PredicateResult::comparison(PredicateLabel::of(self), value, false));
            }
        }
        Ok(PredicateResult::comparison(PredicateLabel::of(self), value, true))
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        let mut entity = self.base.export_snapshot("ListSubsetPredicate");
        entity.add_metadata("strict", Value::Bool(self.strict));
        entity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}

/// The operand must be a member of the value list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMembershipPredicate {
    base: BinaryPredicate,
    strict: bool,
}

impl ListMembershipPredicate {
    pub fn new(operand: impl Into<Operand>, strict: bool) -> Self {
        ListMembershipPredicate {
            base: BinaryPredicate::unconstrained("has-elem", operand),
            strict,
        }
    }

    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl fmt::Display for ListMembershipPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl ValuePredicate for ListMembershipPredicate {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let Value::Array(list) = value else {
            return Ok(TypeMismatchError::new(JsonType::Array, JsonType::of(value), value).into());
        };
        let operand = self.base.resolve_operand(context)?;
        let valid = verify_elem(self.base.name(), self.strict, context, &operand, list)?;
        Ok(PredicateResult::comparison(PredicateLabel::of(self), value, valid))
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        let mut entity = self.base.export_snapshot("ListMembershipPredicate");
        entity.add_metadata("strict", Value::Bool(self.strict));
        entity
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

    fn subset(operand: Value, value: Value) -> PredicateResult {
        DictSubsetPredicate::new(operand)
            .unwrap()
            .evaluate(&ExecutionContext::new(), &value)
            .unwrap()
    }

    fn observed() -> Value {
        json!({
            "name": "web-1",
            "size": 10,
            "labels": {"tier": "front", "env": "prod"},
            "tags": ["http", "https"],
            "disks": [{"name": "boot", "size": 10}, {"name": "data", "size": 100}]
        })
    }

    #[test]
    fn copied_key_subset_is_valid() {
        let result = subset(json!({"name": "web-1", "labels": {"env": "prod"}}), observed());
        assert!(result.is_valid());
        assert_eq!(result.target_path(), "");
    }

    #[test]
    fn whole_value_is_subset_of_itself() {
        assert!(subset(observed(), observed()).is_valid());
    }

    #[test]
    fn changed_scalar_is_reported_at_its_path() {
        let result = subset(json!({"name": "web-1", "labels": {"env": "dev"}}), observed());
        assert!(!result.is_valid());
        assert_eq!(result.target_path(), "labels/env");
        assert_eq!(result.path_value().value, json!("prod"));
        assert_eq!(result.predicate().unwrap().display, "==(\"dev\")->String");
    }

    #[test]
    fn removed_key_is_missing_path() {
        let result = subset(json!({"labels": {"owner": "me"}}), observed());
        assert_eq!(result.kind(), "missing_path");
        assert_eq!(result.target_path(), "labels/owner");
        assert_eq!(result.path_value().path, "labels");
    }

    #[test]
    fn first_failure_in_declaration_order_wins() {
        let result = subset(json!({"size": 11, "name": "other"}), observed());
        assert_eq!(result.target_path(), "size");
        let result = subset(json!({"name": "other", "size": 11}), observed());
        assert_eq!(result.target_path(), "name");
    }

    #[test]
    fn scalar_of_other_type_is_type_mismatch() {
        match subset(json!({"size": "10"}), observed()) {
            PredicateResult::TypeMismatch(e) => {
                assert_eq!(e.expected, JsonType::Number);
                assert_eq!(e.actual, JsonType::String);
                assert_eq!(e.location.target_path, "size");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn numbers_match_across_spellings() {
        assert!(subset(json!({"size": 10.0}), observed()).is_valid());
    }

    #[test]
    fn list_fields_use_list_subset_or_contains() {
        assert!(subset(json!({"tags": ["https"]}), observed()).is_valid());
        assert!(subset(json!({"tags": "http"}), observed()).is_valid());
        assert!(subset(json!({"disks": [{"name": "data"}]}), observed()).is_valid());

        let result = subset(json!({"tags": ["ftp"]}), observed());
        assert!(!result.is_valid());
        assert_eq!(result.target_path(), "tags");
        assert_eq!(result.source(), &observed());
    }

    #[test]
    fn object_field_against_scalar_expectation() {
        let result = subset(json!({"labels": "front"}), observed());
        assert_eq!(result.kind(), "type_mismatch");
        assert_eq!(result.target_path(), "labels");
    }

    #[test]
    fn non_object_value_is_type_mismatch() {
        assert_eq!(subset(json!({"a": 1}), json!([1])).kind(), "type_mismatch");
    }

    #[test]
    fn deferred_operand() {
        let pred = DictSubsetPredicate::new(Operand::binding("EXPECT")).unwrap();
        let ctx = ExecutionContext::new().with_binding("EXPECT", json!({"size": 10}));
        assert!(pred.evaluate(&ctx, &observed()).unwrap().is_valid());
        let bad = ExecutionContext::new().with_binding("EXPECT", json!([1]));
        assert!(pred.evaluate(&bad, &observed()).is_err());
    }

    #[test]
    fn list_operand_rejected_at_construction() {
        assert!(DictSubsetPredicate::new(json!([1])).is_err());
        assert!(ListSubsetPredicate::new(json!({"a": 1}), false).is_err());
    }

    #[test]
    fn list_subset_membership_rules() {
        let ctx = ExecutionContext::new();
        let value = json!([1, "two", {"k": 3, "j": 4}, [5, 6]]);
        let check = |operand: Value, strict: bool| {
            ListSubsetPredicate::new(operand, strict)
                .unwrap()
                .evaluate(&ctx, &value)
                .unwrap()
                .is_valid()
        };
        assert!(check(json!([1, "two"]), false));
        assert!(check(json!([{"k": 3}]), false));
        assert!(check(json!([[6]]), false));
        assert!(!check(json!([{"k": 3}]), true));
        assert!(check(json!([{"k": 3, "j": 4}]), true));
        assert!(!check(json!([7]), false));
        assert!(check(json!([]), false));
    }

    #[test]
    fn list_subset_order_is_not_significant() {
        let pred = ListSubsetPredicate::new(json!([3, 1]), false).unwrap();
        assert!(pred
            .evaluate(&ExecutionContext::new(), &json!([1, 2, 3]))
            .unwrap()
            .is_valid());
    }

    #[test]
    fn null_element_is_a_contract_violation() {
        let pred = ListSubsetPredicate::new(json!([null]), false).unwrap();
        let err = pred
            .evaluate(&ExecutionContext::new(), &json!([null]))
            .unwrap_err();
        assert!(matches!(err, PredicateError::UnsupportedValue { .. }));
        // Strict membership compares literally and accepts null.
        let strict = ListSubsetPredicate::new(json!([null]), true).unwrap();
        assert!(strict
            .evaluate(&ExecutionContext::new(), &json!([null]))
            .unwrap()
            .is_valid());
    }

    #[test]
    fn membership() {
        let ctx = ExecutionContext::new();
        let value = json!([{"name": "a", "zone": "x"}, "b"]);
        assert!(ListMembershipPredicate::new("b", false)
            .evaluate(&ctx, &value)
            .unwrap()
            .is_valid());
        assert!(ListMembershipPredicate::new(json!({"name": "a"}), false)
            .evaluate(&ctx, &value)
            .unwrap()
            .is_valid());
        assert!(!ListMembershipPredicate::new(json!({"name": "a"}), true)
            .evaluate(&ctx, &value)
            .unwrap()
            .is_valid());
        assert_eq!(
            ListMembershipPredicate::new("b", false)
                .evaluate(&ctx, &json!("b"))
                .unwrap()
                .kind(),
            "type_mismatch"
        );
    }

    #[test]
    fn membership_with_deferred_operand() {
        let ctx = ExecutionContext::new().with_binding("ID", json!("i-123"));
        let pred = ListMembershipPredicate::new(Operand::binding("ID"), false);
        assert!(pred.evaluate(&ctx, &json!(["i-000", "i-123"])).unwrap().is_valid());
    }
}
