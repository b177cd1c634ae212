use crate::value::JsonType;

/// Contract violations raised while building or evaluating a predicate.
///
/// These are distinct from a failed match: a mismatch is reported as an
/// invalid [`PredicateResult`](crate::result::PredicateResult), while a
/// `PredicateError` means the predicate tree itself cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    /// The operand does not have the type the predicate requires, either
    /// as a literal at construction or after resolving a deferred operand.
    #[error("operand of '{predicate}' must be {expected}, got {actual}")]
    OperandType {
        predicate: String,
        expected: JsonType,
        actual: JsonType,
    },

    /// A deferred binding was resolved against a context that lacks it.
    #[error("no binding named '{key}' in evaluation context")]
    UnboundBinding { key: String },

    /// A path key resolved to something other than a string.
    #[error("path key must resolve to a String, got {actual}")]
    KeyType { actual: JsonType },

    /// The value (or a list element) has a shape the predicate cannot dispatch on.
    #[error("'{predicate}' cannot be applied to a {actual} value")]
    UnsupportedValue { predicate: String, actual: JsonType },

    /// A deferred operand function reported a failure of its own.
    #[error("deferred operand failed: {message}")]
    Deferred { message: String },
}
