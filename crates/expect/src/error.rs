use std::path::PathBuf;

use vigil_predicate::PredicateError;

use crate::document::OperandKind;

/// Errors raised while loading an expectation document or its bindings.
#[derive(Debug, thiserror::Error)]
pub enum ExpectError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("invalid expectation document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but describes a predicate that cannot be built.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error("unknown comparison operator '{op}' for {kind} operands")]
    UnknownOperator { op: String, kind: OperandKind },

    /// A `compare` with a deferred operand must name the operand type.
    #[error("comparison '{op}' with a deferred operand needs an explicit \"type\"")]
    MissingType { op: String },

    #[error("comparison '{op}' cannot take a null operand")]
    NullOperand { op: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
