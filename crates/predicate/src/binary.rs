//! Base for predicates that compare a value against a bound operand.
//!
//! The operand is the right-hand side of the comparison; the value under
//! test is supplied at evaluation time. For `NUM_LE.bind(10)`, evaluating
//! against `5` asks whether `5 <= 10`.

use std::fmt;

use serde_json::Value;

use crate::context::{ExecutionContext, Operand};
use crate::error::PredicateError;
use crate::snapshot::SnapshotEntity;
use crate::value::JsonType;

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryPredicate {
    name: String,
    operand: Operand,
    operand_type: Option<JsonType>,
}

impl BinaryPredicate {
    /// Bind `operand` under `name`.
    ///
    /// A literal operand is checked against `operand_type` immediately; a
    /// deferred operand is checked each time it is resolved.
    pub fn new(
        name: impl Into<String>,
        operand: impl Into<Operand>,
        operand_type: Option<JsonType>,
    ) -> Result<Self, PredicateError> {
        let name = name.into();
        let operand = operand.into();
        if let (Some(expected), Operand::Literal(value)) = (operand_type, &operand) {
            check_operand_type(&name, expected, value)?;
        }
        Ok(BinaryPredicate {
            name,
            operand,
            operand_type,
        })
    }

    /// Bind `operand` with no type constraint. Never fails.
    pub fn unconstrained(name: impl Into<String>, operand: impl Into<Operand>) -> Self {
        BinaryPredicate {
            name: name.into(),
            operand: operand.into(),
            operand_type: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn operand_type(&self) -> Option<JsonType> {
        self.operand_type
    }

    /// Resolve the operand through `context` and enforce its declared type.
    pub fn resolve_operand(&self, context: &ExecutionContext) -> Result<Value, PredicateError> {
        let operand = context.eval(&self.operand)?;
        if let Some(expected) = self.operand_type {
            check_operand_type(&self.name, expected, &operand)?;
        }
        Ok(operand)
    }

    /// Snapshot with the name and a single `Operand` edge.
    pub fn export_snapshot(&self, kind: &str) -> SnapshotEntity {
        let mut entity = SnapshotEntity::new(kind, self.name.clone());
        if let Some(t) = self.operand_type {
            entity.add_metadata("operand_type", Value::String(t.to_string()));
        }
        entity.add_operand_edge("Operand", &self.operand);
        entity
    }
}

fn check_operand_type(name: &str, expected: JsonType, operand: &Value) -> Result<(), PredicateError> {
    if expected.matches(operand) {
        Ok(())
    } else {
        Err(PredicateError::OperandType {
            predicate: name.to_string(),
            expected,
            actual: JsonType::of(operand),
        })
    }
}

impl fmt::Display for BinaryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = self.operand_type.map_or("Any", JsonType::name);
        write!(f, "{}({})->{}", self.name, self.operand, type_name)
    }
}
