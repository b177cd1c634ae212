//! Loading deferred-operand bindings.
//!
//! Bindings are a flat JSON object from key to value, typically written by
//! the harness after the operation under test has produced identifiers.

use std::path::Path;

use serde_json::Value;
use vigil_predicate::ExecutionContext;

use crate::error::ExpectError;

/// Build an execution context from a JSON object of bindings.
///
/// `null` is treated as an empty set of bindings.
pub fn load_bindings(document: &Value) -> Result<ExecutionContext, ExpectError> {
    if document.is_null() {
        return Ok(ExecutionContext::new());
    }
    let context = ExecutionContext::from_json(document)?;
    tracing::debug!(count = context.bindings.len(), "loaded bindings");
    Ok(context)
}

pub fn load_bindings_str(text: &str) -> Result<ExecutionContext, ExpectError> {
    let document: Value = serde_json::from_str(text)?;
    load_bindings(&document)
}

pub fn load_bindings_file(path: &Path) -> Result<ExecutionContext, ExpectError> {
    let text = std::fs::read_to_string(path).map_err(|source| ExpectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bindings_str(&text)
}
