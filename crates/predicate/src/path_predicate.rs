//! Projects a predicate onto a named location inside a container.

use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::context::{ExecutionContext, Operand};
use crate::error::PredicateError;
use crate::path::{self, PathValue};
use crate::predicate::{same_predicate, PredicateRef, ValuePredicate};
use crate::result::{MissingPathError, PredicateResult, ResultLocation};
use crate::snapshot::SnapshotEntity;

/// Applies `predicate` to the value found at `key` inside the container.
///
/// The key may be a field name, an index segment like `[2]`, or a nested
/// path such as `spec/ports/[0]`. Results are re-rooted onto the container
/// so their `target_path` begins with the resolved key.
#[derive(Debug, Clone)]
pub struct PathPredicate {
    key: Operand,
    predicate: PredicateRef,
}

impl PathPredicate {
    pub fn new(key: impl Into<Operand>, predicate: PredicateRef) -> Self {
        PathPredicate {
            key: key.into(),
            predicate,
        }
    }

    pub fn key(&self) -> &Operand {
        &self.key
    }

    pub fn predicate(&self) -> &PredicateRef {
        &self.predicate
    }
}

impl PartialEq for PathPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && *self.predicate == *other.predicate
    }
}

impl fmt::Display for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.predicate)
    }
}

impl ValuePredicate for PathPredicate {
    fn name(&self) -> &str {
        "Path"
    }

    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError> {
        let key = context.eval_key(&self.key)?;
        match path::lookup(value, &key) {
            None => {
                tracing::trace!(path = %key, "path not present in value");
                Ok(MissingPathError {
                    location: ResultLocation::new(value, key, PathValue::new("", value.clone())),
                }
                .into())
            }
            Some(found) => {
                let result = self.predicate.evaluate(context, found)?;
                Ok(result.clone_with_source(value, &key, &key))
            }
        }
    }

    fn export_snapshot(&self) -> SnapshotEntity {
        let mut entity = SnapshotEntity::new("PathPredicate", "Path");
        entity.add_operand_edge("Key", &self.key);
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
