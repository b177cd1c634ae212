//! Vigil expectation documents.
//!
//! Declarative JSON descriptions of predicate trees, compiled into
//! [`vigil_predicate::PredicateRef`] values, plus loading of the bindings
//! that deferred operands resolve against.

pub mod bindings;
pub mod document;
pub mod error;

pub use bindings::{load_bindings, load_bindings_file, load_bindings_str};
pub use document::{compile_expectation, operand_from_json, ExpectationSpec, OperandKind};
pub use error::ExpectError;
