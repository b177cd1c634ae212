//! Exact field-predicate matching for objects and quantified
//! element-predicate matching for lists.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::context::{ExecutionContext, Operand};
use crate::error::PredicateError;
use crate::map_predicate::MapPredicate;
use crate::path::{self, PathValue, PATH_SEPARATOR};
use crate::path_predicate::PathPredicate;
use crate::predicate::{same_predicate, PredicateRef, ValuePredicate};
use crate::result::{
    KeyedPredicateResultBuilder, PredicateLabel, PredicateResult, ResultLocation,
    SequencedPredicateResultBuilder, TypeMismatchError, UnexpectedPathError,
};
use crate::snapshot::SnapshotEntity;
use crate::value::JsonType;

// ──────────────────────────────────────────────
// Objects
// ──────────────────────────────────────────────

/// Matches an object field by field.
///
/// The operand maps field names to the predicate each field must satisfy,
/// e.g. `{"n": EQUIVALENT(10), "s": CONTAINS("text")}`. When `strict`, the
/// object may not carry fields the operand does not name.
#[derive(Debug, Clone, PartialEq)]
pub struct DictMatchesPredicate {
    fields: Vec<(Operand, PredicateRef)>,
    strict: bool,
}

impl DictMatchesPredicate {
    /// Literal field keys must be strings; deferred keys are checked when
    /// resolved.
    pub fn new<K>(
        fields: impl IntoIterator<Item = (K, PredicateRef)>,
        strict: bool,
    ) -> Result<Self, PredicateError>
    where
        K: Into<Operand>,
    {
        let fields = fields
            .into_iter()
            .map(|(key, pred)| {
                let key: Operand = key.into();
                if let Some(other) = key.literal().filter(|v| !v.is_string()) {
                    return Err(PredicateError::KeyType {
                        actual: JsonType::of(other),
                    });
                }
                Ok((key, pred))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DictMatchesPredicate { fields, strict })
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn fields(&self) -> &[(Operand, PredicateRef)] {
        &self.fields
    }

    /// Fields of `source` that no declared key accounts for. A nested key
    /// such as `status/phase` accounts for its top-level field `status`.
    fn find_unexpected_path_errors(
        &self,
        expected: &BTreeSet<String>,
        source: &Value,
    ) -> Vec<(String, PredicateResult)> {
        let Value::Object(map) = source else {
            return Vec::new();
        };
        map.iter()
            .filter(|(key, _)| !expected.contains(key.as_str()))
            .map(|(key, value)| {
                let error = UnexpectedPathError {
                    location: ResultLocation::new(
                        source,
                        key.clone(),
                        PathValue::new(key.clone(), value.clone()),
                    ),
                };
                (key.clone(), error.into())
            })
            .collect()
    }
}

impl fmt::Display for DictMatchesPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matches({")?;
        for (i, (key, pred)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, pred)?;
        }
        write!(f, "}}, strict={})", self.strict)
    }
}

impl ValuePredicate for DictMatchesPredicate {
    fn name(&self) -> &str {
        "Matches"
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        if !value.is_object() {
            return Ok(TypeMismatchError::new(JsonType::Object, JsonType::of(value), value).into());
        }

        let mut builder = KeyedPredicateResultBuilder::new(PredicateLabel::of(self), value);
        let mut valid = true;
        let mut expected = BTreeSet::new();
        for (key, pred) in &self.fields {
            let name = context.eval_key(key)?;
            let result =
                PathPredicate::new(name.clone(), pred.clone()).evaluate(context, value)?;
            if !result.is_valid() {
                valid = false;
            }
            let top = name.split(PATH_SEPARATOR).next().unwrap_or_default();
            expected.insert(top.to_string());
            builder.add_result(name, result);
        }

        if self.strict {
            let errors = self.find_unexpected_path_errors(&expected, value);
            if !errors.is_empty() {
                tracing::debug!(
                    unexpected = ?errors.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                    "strict object match found unexpected fields"
                );
                valid = false;
                builder.update_results(errors);
            }
        }

        Ok(builder.build(valid).into())
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        let mut entity = SnapshotEntity::new("DictMatchesPredicate", "Matches");
        entity.add_metadata("strict", Value::Bool(self.strict));
        for (key, pred) in &self.fields {
            entity.add_entity_edge(key.to_string(), pred.export_snapshot());
        }
        entity
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

/// Matches list elements against a list of patterns.
///
/// Every pattern must be satisfied by at least one element. When `strict`,
/// every element must satisfy at least one pattern. When `unique`, each
/// pattern may be satisfied by at most one element.
///
/// Patterns are checked one at a time, not assigned to elements: a single
/// element may satisfy several patterns, and `unique` bounds witnesses per
/// pattern rather than requiring a one-to-one pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMatchesPredicate {
    patterns: Vec<PredicateRef>,
    strict: bool,
    unique: bool,
}

impl ListMatchesPredicate {
    pub fn new(patterns: Vec<PredicateRef>, strict: bool, unique: bool) -> Self {
        ListMatchesPredicate {
            patterns,
            strict,
            unique,
        }
    }

    pub fn patterns(&self) -> &[PredicateRef] {
        &self.patterns
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    fn find_strictness_errors(matched: &[usize], source: &Value, items: &[Value]) -> Vec<PredicateResult> {
        matched
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(index, _)| {
                let path = path::index_segment(index);
                UnexpectedPathError {
                    location: ResultLocation::new(
                        source,
                        path.clone(),
                        PathValue::new(path, items[index].clone()),
                    ),
                }
                .into()
            })
            .collect()
    }
}

impl fmt::Display for ListMatchesPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matches([")?;
        for (i, pred) in self.patterns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", pred)?;
        }
        write!(f, "], strict={}, unique={})", self.strict, self.unique)
    }
}

impl ValuePredicate for ListMatchesPredicate {
    fn name(&self) -> &str {
        "Matches"
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let Value::Array(items) = value else {
            return Ok(TypeMismatchError::new(JsonType::Array, JsonType::of(value), value).into());
        };

        let max = if self.unique { Some(1) } else { None };
        let mut builder = SequencedPredicateResultBuilder::new(PredicateLabel::of(self), value);
        let mut valid = true;
        let mut matched = vec![0usize; items.len()];
        for pattern in &self.patterns {
            let result = MapPredicate::new(pattern.clone(), max).apply(context, items, value)?;
            if !result.valid {
                valid = false;
            }
            for index in result.good_indexes() {
                matched[index] += 1;
            }
            builder.append_result(result.into());
        }

        if self.strict {
            let errors = Self::find_strictness_errors(&matched, value, items);
            if !errors.is_empty() {
                tracing::debug!(
                    unmatched = errors.len(),
                    "strict list match found elements satisfying no pattern"
                );
                valid = false;
                builder.extend_results(errors);
            }
        }

        Ok(builder.build(valid).into())
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        let mut entity = SnapshotEntity::new("ListMatchesPredicate", "Matches");
        entity.add_metadata("strict", Value::Bool(self.strict));
        entity.add_metadata("unique", Value::Bool(self.unique));
        for (index, pred) in self.patterns.iter().enumerate() {
            entity.add_entity_edge(path::index_segment(index), pred.export_snapshot());
        }
        entity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}
