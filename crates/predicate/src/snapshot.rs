//! Read-only export of predicate trees for external graph/report builders.
//!
//! A predicate exports itself as a [`SnapshotEntity`]: its name, scalar
//! metadata (flags such as `strict`) and labeled edges to its operands.
//! Operands that are themselves predicates become nested entities.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::Operand;

/// Target of a labeled snapshot edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum SnapshotNode {
    Entity { entity: SnapshotEntity },
    Value { value: Value },
    Deferred { description: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEdge {
    pub label: String,
    pub target: SnapshotNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntity {
    /// Rust type of the exported predicate, e.g. `DictMatchesPredicate`.
    pub kind: String,
    pub name: String,
    pub metadata: Map<String, Value>,
    pub edges: Vec<SnapshotEdge>,
}

impl SnapshotEntity {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        SnapshotEntity {
            kind: kind.into(),
            name: name.into(),
            metadata: Map::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Edge to a plain or deferred operand.
    pub fn add_operand_edge(&mut self, label: impl Into<String>, operand: &Operand) -> &mut Self {
        let target = match operand {
            Operand::Literal(value) => SnapshotNode::Value {
                value: value.clone(),
            },
            Operand::Deferred(d) => SnapshotNode::Deferred {
                description: d.to_string(),
            },
        };
        self.edges.push(SnapshotEdge {
            label: label.into(),
            target,
        });
        self
    }

    /// Edge to a nested predicate's own export.
    pub fn add_entity_edge(&mut self, label: impl Into<String>, entity: SnapshotEntity) -> &mut Self {
        self.edges.push(SnapshotEdge {
            label: label.into(),
            target: SnapshotNode::Entity { entity },
        });
        self
    }

    pub fn edge(&self, label: &str) -> Option<&SnapshotNode> {
        self.edges
            .iter()
            .find(|edge| edge.label == label)
            .map(|edge| &edge.target)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
