//! Operands and the evaluation context that resolves them.
//!
//! A predicate's operand is bound when the predicate is built, but its
//! value may not be known until the test runs (for example an identifier
//! generated by the operation under test). Such operands are `Deferred`
//! and resolved against an [`ExecutionContext`] on every evaluation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::PredicateError;
use crate::value::JsonType;

/// Signature of a computed operand.
pub type DeferredFn = dyn Fn(&ExecutionContext) -> Result<Value, PredicateError> + Send + Sync;

/// An operand whose value is produced at evaluation time.
#[derive(Clone)]
pub enum Deferred {
    /// Look up a pre-agreed key in the context bindings.
    Binding(String),
    /// Compute the value from the context.
    Function(Arc<DeferredFn>),
}

impl Deferred {
    pub fn binding(key: impl Into<String>) -> Self {
        Deferred::Binding(key.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Result<Value, PredicateError> + Send + Sync + 'static,
    {
        Deferred::Function(Arc::new(f))
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deferred::Binding(key) => f.debug_tuple("Binding").field(key).finish(),
            Deferred::Function(func) => write!(f, "Function({:p})", Arc::as_ptr(func)),
        }
    }
}

impl fmt::Display for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deferred::Binding(key) => write!(f, "${}", key),
            Deferred::Function(_) => f.write_str("<deferred>"),
        }
    }
}

/// Bindings compare by key; functions compare by identity.
impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Deferred::Binding(a), Deferred::Binding(b)) => a == b,
            (Deferred::Function(a), Deferred::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The comparison value bound into a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Deferred(Deferred),
}

impl Operand {
    pub fn binding(key: impl Into<String>) -> Self {
        Operand::Deferred(Deferred::binding(key))
    }

    pub fn literal(&self) -> Option<&Value> {
        match self {
            Operand::Literal(v) => Some(v),
            Operand::Deferred(_) => None,
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Literal(Value::String(value))
    }
}

impl From<Deferred> for Operand {
    fn from(value: Deferred) -> Self {
        Operand::Deferred(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Deferred(d) => write!(f, "{}", d),
        }
    }
}

/// Resolves deferred operands and keys during evaluation.
///
/// The context is only read by the engine, so one context can be shared by
/// concurrent evaluations.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub bindings: BTreeMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        ExecutionContext {
            bindings: BTreeMap::new(),
        }
    }

    /// Builder-style binding insertion.
    pub fn with_binding(mut self, key: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.bindings.insert(key.into(), value);
    }

    /// Build a context from a JSON object of bindings.
    pub fn from_json(bindings: &Value) -> Result<Self, PredicateError> {
        let obj = bindings.as_object().ok_or(PredicateError::OperandType {
            predicate: "bindings".to_string(),
            expected: JsonType::Object,
            actual: JsonType::of(bindings),
        })?;
        Ok(ExecutionContext {
            bindings: obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    /// Resolve an operand to its value.
    ///
    /// Deferred operands are re-resolved on every call.
    pub fn eval(&self, operand: &Operand) -> Result<Value, PredicateError> {
        match operand {
            Operand::Literal(v) => Ok(v.clone()),
            Operand::Deferred(Deferred::Binding(key)) => self
                .bindings
                .get(key)
                .cloned()
                .ok_or_else(|| PredicateError::UnboundBinding { key: key.clone() }),
            Operand::Deferred(Deferred::Function(f)) => f(self),
        }
    }

    /// Resolve an operand used as a path key; it must produce a string.
    pub fn eval_key(&self, key: &Operand) -> Result<String, PredicateError> {
        match self.eval(key)? {
            Value::String(s) => Ok(s),
            other => Err(PredicateError::KeyType {
                actual: JsonType::of(&other),
            }),
        }
    }
}
