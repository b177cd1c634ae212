//! The value-predicate capability shared by every matcher.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::PredicateError;
use crate::result::PredicateResult;
use crate::snapshot::SnapshotEntity;

/// A predicate applied to an observed value.
///
/// Implementations are immutable once built, so a predicate tree can be
/// evaluated from many threads at once.
pub trait ValuePredicate: fmt::Debug + fmt::Display + Send + Sync + Any {
    /// Short identifier, e.g. `"=="` or `"has-subset"`.
    fn name(&self) -> &str;

    /// Apply the predicate to `value`.
    ///
    /// A mismatch is an `Ok` result that is not valid. `Err` is reserved for
    /// contract violations such as an operand of the wrong type.
    fn evaluate(
        &self,
        context: &ExecutionContext,
        value: &Value,
    ) -> Result<PredicateResult, PredicateError>;

    /// Export name, flags and operand edges for an external snapshot builder.
    fn export_snapshot(&self) -> SnapshotEntity;

    fn as_any(&self) -> &dyn Any;

    /// Value equality across predicate trait objects.
    fn eq_predicate(&self, other: &dyn ValuePredicate) -> bool;

    fn into_ref(self) -> PredicateRef
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

/// Shared handle to a predicate inside a predicate tree.
pub type PredicateRef = Arc<dyn ValuePredicate>;

impl PartialEq for dyn ValuePredicate {
    fn eq(&self, other: &Self) -> bool {
        self.eq_predicate(other)
    }
}

/// `eq_predicate` for a concrete predicate type: equal only to another
/// instance of the same type that compares equal.
pub(crate) fn same_predicate<T>(this: &T, other: &dyn ValuePredicate) -> bool
where
    T: PartialEq + 'static,
{
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| this == other)
}
