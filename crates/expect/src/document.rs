//! Expectation documents: predicate trees written as JSON.
//!
//! ```json
//! {
//!   "predicate": "dict-matches",
//!   "strict": false,
//!   "fields": {
//!     "name":   {"predicate": "compare", "op": "==", "operand": {"$binding": "NAME"}, "type": "string"},
//!     "disks":  {"predicate": "list-member", "operand": {"boot": true}}
//!   }
//! }
//! ```
//!
//! Any operand of the exact form `{"$binding": "KEY"}` is deferred and
//! resolved from the execution context at evaluation time.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use vigil_predicate::{
    ContainsPredicate, DictMatchesPredicate, DictSubsetPredicate, DifferentPredicate,
    EquivalentPredicate, JsonType, ListMatchesPredicate, ListMembershipPredicate,
    ListSubsetPredicate, MapPredicate, Operand, PathPredicate, PredicateRef,
    StandardBinaryPredicateFactory, ValuePredicate, BOOL_EQ, BOOL_NE, DICT_EQ, DICT_NE, LIST_EQ,
    LIST_NE, LIST_SIMILAR, NUM_EQ, NUM_GE, NUM_LE, NUM_NE, STR_EQ, STR_NE, STR_SUBSTR,
};

use crate::error::ExpectError;

/// Key marking a deferred operand.
pub const BINDING_KEY: &str = "$binding";

/// Operand type accepted by `compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandKind {
    Number,
    String,
    Bool,
    Object,
    Array,
}

impl OperandKind {
    /// Kind of a literal operand; `None` for null.
    pub fn of(value: &Value) -> Option<Self> {
        match JsonType::of(value) {
            JsonType::Number => Some(OperandKind::Number),
            JsonType::String => Some(OperandKind::String),
            JsonType::Bool => Some(OperandKind::Bool),
            JsonType::Object => Some(OperandKind::Object),
            JsonType::Array => Some(OperandKind::Array),
            JsonType::Null => None,
        }
    }

    pub fn json_type(self) -> JsonType {
        match self {
            OperandKind::Number => JsonType::Number,
            OperandKind::String => JsonType::String,
            OperandKind::Bool => JsonType::Bool,
            OperandKind::Object => JsonType::Object,
            OperandKind::Array => JsonType::Array,
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.json_type(), f)
    }
}

/// One node of an expectation document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "predicate", rename_all = "kebab-case")]
pub enum ExpectationSpec {
    Compare {
        op: String,
        #[serde(rename = "type", default)]
        operand_type: Option<OperandKind>,
        operand: Value,
    },
    Contains {
        operand: Value,
    },
    Equivalent {
        operand: Value,
    },
    Different {
        operand: Value,
    },
    DictSubset {
        operand: Value,
    },
    ListSubset {
        operand: Value,
        #[serde(default)]
        strict: bool,
    },
    ListMember {
        operand: Value,
        #[serde(default)]
        strict: bool,
    },
    DictMatches {
        #[serde(deserialize_with = "ordered_fields")]
        fields: Vec<(String, ExpectationSpec)>,
        #[serde(default)]
        strict: bool,
    },
    ListMatches {
        patterns: Vec<ExpectationSpec>,
        #[serde(default)]
        strict: bool,
        #[serde(default)]
        unique: bool,
    },
    Path {
        path: Value,
        expect: Box<ExpectationSpec>,
    },
    Map {
        expect: Box<ExpectationSpec>,
        #[serde(default)]
        max: Option<usize>,
    },
}

/// Field expectations keep the order the document declares them in.
fn ordered_fields<'de, D>(deserializer: D) -> Result<Vec<(String, ExpectationSpec)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = Vec<(String, ExpectationSpec)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping field paths to expectations")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, spec)) = map.next_entry::<String, ExpectationSpec>()? {
                fields.push((key, spec));
            }
            Ok(fields)
        }
    }

    deserializer.deserialize_map(FieldsVisitor)
}

/// Interpret a document operand, recognizing `{"$binding": "KEY"}`.
pub fn operand_from_json(value: &Value) -> Operand {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            if let Some(Value::String(key)) = map.get(BINDING_KEY) {
                return Operand::binding(key.clone());
            }
        }
    }
    Operand::Literal(value.clone())
}

fn compare_factory(op: &str, kind: OperandKind) -> Option<StandardBinaryPredicateFactory> {
    let factory = match (kind, op) {
        (OperandKind::Number, "<=") => NUM_LE,
        (OperandKind::Number, ">=") => NUM_GE,
        (OperandKind::Number, "==") => NUM_EQ,
        (OperandKind::Number, "!=") => NUM_NE,
        (OperandKind::String, "has-substring") => STR_SUBSTR,
        (OperandKind::String, "==") => STR_EQ,
        (OperandKind::String, "!=") => STR_NE,
        (OperandKind::Bool, "==") => BOOL_EQ,
        (OperandKind::Bool, "!=") => BOOL_NE,
        (OperandKind::Object, "==") => DICT_EQ,
        (OperandKind::Object, "!=") => DICT_NE,
        (OperandKind::Array, "==") => LIST_EQ,
        (OperandKind::Array, "!=") => LIST_NE,
        (OperandKind::Array, "~=") => LIST_SIMILAR,
        _ => return None,
    };
    Some(factory)
}

impl ExpectationSpec {
    pub fn from_json(document: &Value) -> Result<Self, ExpectError> {
        Ok(ExpectationSpec::deserialize(document)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ExpectError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the predicate tree this document describes.
    pub fn compile(&self) -> Result<PredicateRef, ExpectError> {
        let predicate = match self {
            ExpectationSpec::Compare {
                op,
                operand_type,
                operand,
            } => {
                let operand = operand_from_json(operand);
                let kind = match (operand_type, operand.literal()) {
                    (Some(kind), _) => *kind,
                    (None, Some(literal)) => OperandKind::of(literal)
                        .ok_or_else(|| ExpectError::NullOperand { op: op.clone() })?,
                    (None, None) => return Err(ExpectError::MissingType { op: op.clone() }),
                };
                let factory =
                    compare_factory(op, kind).ok_or_else(|| ExpectError::UnknownOperator {
                        op: op.clone(),
                        kind,
                    })?;
                factory.bind(operand)?.into_ref()
            }
            ExpectationSpec::Contains { operand } => {
                ContainsPredicate::new(operand_from_json(operand)).into_ref()
            }
            ExpectationSpec::Equivalent { operand } => {
                EquivalentPredicate::new(operand_from_json(operand)).into_ref()
            }
            ExpectationSpec::Different { operand } => {
                DifferentPredicate::new(operand_from_json(operand)).into_ref()
            }
            ExpectationSpec::DictSubset { operand } => {
                DictSubsetPredicate::new(operand_from_json(operand))?.into_ref()
            }
            ExpectationSpec::ListSubset { operand, strict } => {
                ListSubsetPredicate::new(operand_from_json(operand), *strict)?.into_ref()
            }
            ExpectationSpec::ListMember { operand, strict } => {
                ListMembershipPredicate::new(operand_from_json(operand), *strict).into_ref()
            }
            ExpectationSpec::DictMatches { fields, strict } => {
                let fields = fields
                    .iter()
                    .map(|(key, spec)| Ok((key.as_str(), spec.compile()?)))
                    .collect::<Result<Vec<_>, ExpectError>>()?;
                DictMatchesPredicate::new(fields, *strict)?.into_ref()
            }
            ExpectationSpec::ListMatches {
                patterns,
                strict,
                unique,
            } => {
                let patterns = patterns
                    .iter()
                    .map(ExpectationSpec::compile)
                    .collect::<Result<Vec<_>, _>>()?;
                ListMatchesPredicate::new(patterns, *strict, *unique).into_ref()
            }
            ExpectationSpec::Path { path, expect } => {
                PathPredicate::new(operand_from_json(path), expect.compile()?).into_ref()
            }
            ExpectationSpec::Map { expect, max } => {
                MapPredicate::new(expect.compile()?, *max).into_ref()
            }
        };
        tracing::trace!(predicate = %predicate, "compiled expectation");
        Ok(predicate)
    }
}

/// Parse and compile an expectation document in one step.
pub fn compile_expectation(document: &Value) -> Result<PredicateRef, ExpectError> {
    ExpectationSpec::from_json(document)?.compile()
}
