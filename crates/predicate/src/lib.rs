//! Vigil predicate engine -- declarative assertions over JSON values.
//!
//! A predicate is built once from an expectation and applied to observed
//! JSON (typically a resource returned by an API under test). Evaluation
//! produces a [`PredicateResult`] tree recording where each comparison
//! was made, what was found there, and whether it held.
//!
//! Mismatches are ordinary invalid results. Only contract violations,
//! such as an operand of the wrong type or an unbound deferred operand,
//! surface as [`PredicateError`].
//!
//! Numbers are compared as decimals, so `1` and `1.0` are equal.

pub mod binary;
pub mod context;
pub mod error;
pub mod map_predicate;
pub mod matches;
pub mod numeric;
pub mod path;
pub mod path_predicate;
pub mod polymorphic;
pub mod predicate;
pub mod result;
pub mod snapshot;
pub mod standard;
pub mod subset;
pub mod value;

pub use binary::BinaryPredicate;
pub use context::{Deferred, ExecutionContext, Operand};
pub use error::PredicateError;
pub use map_predicate::MapPredicate;
pub use matches::{DictMatchesPredicate, ListMatchesPredicate};
pub use path::PathValue;
pub use path_predicate::PathPredicate;
pub use polymorphic::{ContainsPredicate, DifferentPredicate, EquivalentPredicate};
pub use predicate::{PredicateRef, ValuePredicate};
pub use result::{
    KeyedPredicateResult, MapPredicateResult, PathValueResult, PredicateLabel, PredicateResult,
    ResultLocation, SequencedPredicateResult, TypeMismatchError,
};
pub use snapshot::{SnapshotEdge, SnapshotEntity, SnapshotNode};
pub use standard::{
    StandardBinaryPredicate, StandardBinaryPredicateFactory, BOOL_EQ, BOOL_NE, DICT_EQ, DICT_NE,
    LIST_EQ, LIST_NE, LIST_SIMILAR, NUM_EQ, NUM_GE, NUM_LE, NUM_NE, STR_EQ, STR_NE, STR_SUBSTR,
};
pub use subset::{DictSubsetPredicate, ListMembershipPredicate, ListSubsetPredicate};
pub use value::JsonType;
