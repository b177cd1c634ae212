//! Applies one predicate across every element of a sequence.

use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::PredicateError;
use crate::predicate::{same_predicate, PredicateRef, ValuePredicate};
use crate::result::{
    MapPredicateResult, PredicateLabel, PredicateResult, ResultLocation, TypeMismatchError,
};
use crate::snapshot::SnapshotEntity;
use crate::value::JsonType;

/// Existential match with an optional cap.
///
/// Valid when at least one element satisfies the predicate and, if `max`
/// is set, no more than `max` elements do. Every element is evaluated; the
/// per-index outcomes are kept in the result.
#[derive(Debug, Clone)]
pub struct MapPredicate {
    predicate: PredicateRef,
    max: Option<usize>,
}

impl MapPredicate {
    pub fn new(predicate: PredicateRef, max: Option<usize>) -> Self {
        MapPredicate { predicate, max }
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Same as [`ValuePredicate::evaluate`] but returns the concrete result.
    pub fn apply(
        &self,
        context: &ExecutionContext,
        items: &[Value],
        source: &Value,
    ) -> Result<MapPredicateResult, PredicateError> {
        let mut results = Vec::with_capacity(items.len());
        let mut good_count = 0usize;
        for (index, elem) in items.iter().enumerate() {
            let result = self.predicate.evaluate(context, elem)?;
            tracing::trace!(index, valid = result.is_valid(), predicate = %self.predicate, "map element");
            if result.is_valid() {
                good_count += 1;
            }
            results.push(result);
        }
        let within_max = self.max.map_or(true, |max| good_count <= max);
        Ok(MapPredicateResult {
            predicate: PredicateLabel::of(self),
            location: ResultLocation::root(source),
            results,
            good_count,
            max: self.max,
            valid: good_count > 0 && within_max,
        })
    }
}

impl PartialEq for MapPredicate {
    fn eq(&self, other: &Self) -> bool {
        *self.predicate == *other.predicate && self.max == other.max
    }
}

impl fmt::Display for MapPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "Map({}, max={})", self.predicate, max),
            None => write!(f, "Map({})", self.predicate),
        }
    }
}

impl ValuePredicate for MapPredicate {
    fn name(&self) -> &str {
        "Map"
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        match value {
            Value::Array(items) => Ok(self.apply(context, items, value)?.into()),
            other => Ok(TypeMismatchError::new(JsonType::Array, JsonType::of(other), other).into()),
        }
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        let mut entity = SnapshotEntity::new("MapPredicate", "Map");
        if let Some(max) = self.max {
            entity.add_metadata("max", Value::from(max));
        }
        entity.add_entity_edge("Predicate", self.predicate.export_snapshot());
        entity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool {
        same_predicate(self, other)
    }
}
