//! Path-tracked outcomes of applying predicates to values.
//!
//! Every outcome records the value it examined (`source`), the path inside
//! that value where the outcome is localized (`target_path`) and the value
//! actually compared there (`path_value`). Failures that carry typed
//! context (type mismatch, missing path, unexpected path) are ordinary
//! results, not errors; they compose into aggregates like successes do.
//!
//! Aggregates are built in two phases: entries are accumulated, then the
//! builder is frozen with an explicit validity, because strict and unique
//! constraints make validity depend on more than the entries themselves.

use serde::Serialize;
use serde_json::Value;

use crate::path::{self, PathValue};
use crate::predicate::ValuePredicate;
use crate::value::JsonType;

/// Identity of the predicate that produced a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateLabel {
    pub name: String,
    pub display: String,
}

impl PredicateLabel {
    pub fn of<P: ValuePredicate + ?Sized>(pred: &P) -> Self {
        PredicateLabel {
            name: pred.name().to_string(),
            display: pred.to_string(),
        }
    }
}

/// Where an outcome is localized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultLocation {
    pub source: Value,
    pub target_path: String,
    pub path_value: PathValue,
}

impl ResultLocation {
    /// Location at the root of `value`.
    pub fn root(value: &Value) -> Self {
        ResultLocation {
            source: value.clone(),
            target_path: String::new(),
            path_value: PathValue::new("", value.clone()),
        }
    }

    pub fn new(source: &Value, target_path: impl Into<String>, path_value: PathValue) -> Self {
        ResultLocation {
            source: source.clone(),
            target_path: target_path.into(),
            path_value,
        }
    }

    fn rebase(&self, source: &Value, base_target_path: &str, base_value_path: &str) -> Self {
        ResultLocation {
            source: source.clone(),
            target_path: path::join(base_target_path, &self.target_path),
            path_value: PathValue::new(
                path::join(base_value_path, &self.path_value.path),
                self.path_value.value.clone(),
            ),
        }
    }
}

/// Plain outcome of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValueResult {
    pub predicate: PredicateLabel,
    #[serde(flatten)]
    pub location: ResultLocation,
    pub valid: bool,
}

/// The value (or operand) had the wrong runtime type for the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMismatchError {
    pub expected: JsonType,
    pub actual: JsonType,
    #[serde(flatten)]
    pub location: ResultLocation,
}

impl TypeMismatchError {
    /// Mismatch reported at the root of the offending value.
    pub fn new(expected: JsonType, actual: JsonType, value: &Value) -> Self {
        TypeMismatchError {
            expected,
            actual,
            location: ResultLocation::root(value),
        }
    }

    pub fn at(expected: JsonType, actual: JsonType, location: ResultLocation) -> Self {
        TypeMismatchError {
            expected,
            actual,
            location,
        }
    }
}

/// A path required by the expectation is absent from the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingPathError {
    #[serde(flatten)]
    pub location: ResultLocation,
}

/// A path present in the value is not allowed by the expectation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnexpectedPathError {
    #[serde(flatten)]
    pub location: ResultLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedEntry {
    pub key: String,
    pub result: PredicateResult,
}

/// Aggregate over an Object match: one entry per field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedPredicateResult {
    pub predicate: PredicateLabel,
    #[serde(flatten)]
    pub location: ResultLocation,
    pub results: Vec<KeyedEntry>,
    pub valid: bool,
}

impl KeyedPredicateResult {
    pub fn get(&self, key: &str) -> Option<&PredicateResult> {
        self.results
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.result)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|entry| entry.key.as_str())
    }
}

/// Aggregate over an Array match: one entry per pattern, plus any
/// strictness failures appended after them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencedPredicateResult {
    pub predicate: PredicateLabel,
    #[serde(flatten)]
    pub location: ResultLocation,
    pub results: Vec<PredicateResult>,
    pub valid: bool,
}

/// Per-element outcomes of applying one predicate across a sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPredicateResult {
    pub predicate: PredicateLabel,
    #[serde(flatten)]
    pub location: ResultLocation,
    pub results: Vec<PredicateResult>,
    pub good_count: usize,
    pub max: Option<usize>,
    pub valid: bool,
}

impl MapPredicateResult {
    pub fn good_indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_valid())
            .map(|(i, _)| i)
    }
}

/// Outcome of applying a predicate to a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateResult {
    PathValue(PathValueResult),
    TypeMismatch(TypeMismatchError),
    MissingPath(MissingPathError),
    UnexpectedPath(UnexpectedPathError),
    Keyed(KeyedPredicateResult),
    Sequenced(SequencedPredicateResult),
    Map(MapPredicateResult),
}

impl PredicateResult {
    /// Shorthand for a plain comparison outcome at the root of `value`.
    pub fn comparison(predicate: PredicateLabel, value: &Value, valid: bool) -> Self {
        PredicateResult::PathValue(PathValueResult {
            predicate,
            location: ResultLocation::root(value),
            valid,
        })
    }

    pub fn is_valid(&self) -> bool {
        match self {
            PredicateResult::PathValue(r) => r.valid,
            PredicateResult::TypeMismatch(_)
            | PredicateResult::MissingPath(_)
            | PredicateResult::UnexpectedPath(_) => false,
            PredicateResult::Keyed(r) => r.valid,
            PredicateResult::Sequenced(r) => r.valid,
            PredicateResult::Map(r) => r.valid,
        }
    }

    pub fn location(&self) -> &ResultLocation {
        match self {
            PredicateResult::PathValue(r) => &r.location,
            PredicateResult::TypeMismatch(r) => &r.location,
            PredicateResult::MissingPath(r) => &r.location,
            PredicateResult::UnexpectedPath(r) => &r.location,
            PredicateResult::Keyed(r) => &r.location,
            PredicateResult::Sequenced(r) => &r.location,
            PredicateResult::Map(r) => &r.location,
        }
    }

    pub fn source(&self) -> &Value {
        &self.location().source
    }

    pub fn target_path(&self) -> &str {
        &self.location().target_path
    }

    pub fn path_value(&self) -> &PathValue {
        &self.location().path_value
    }

    /// The producing predicate, for kinds that record one.
    pub fn predicate(&self) -> Option<&PredicateLabel> {
        match self {
            PredicateResult::PathValue(r) => Some(&r.predicate),
            PredicateResult::Keyed(r) => Some(&r.predicate),
            PredicateResult::Sequenced(r) => Some(&r.predicate),
            PredicateResult::Map(r) => Some(&r.predicate),
            _ => None,
        }
    }

    /// Short name of the result kind, matching its serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            PredicateResult::PathValue(_) => "path_value",
            PredicateResult::TypeMismatch(_) => "type_mismatch",
            PredicateResult::MissingPath(_) => "missing_path",
            PredicateResult::UnexpectedPath(_) => "unexpected_path",
            PredicateResult::Keyed(_) => "keyed",
            PredicateResult::Sequenced(_) => "sequenced",
            PredicateResult::Map(_) => "map",
        }
    }

    /// Copy this result onto a new source, prefixing its paths.
    ///
    /// Nested results are rebased the same way so every path in the tree
    /// stays relative to the new source.
    pub fn clone_with_source(
        &self,
        source: &Value,
        base_target_path: &str,
        base_value_path: &str,
    ) -> PredicateResult {
        let rebase = |loc: &ResultLocation| loc.rebase(source, base_target_path, base_value_path);
        let rebase_all = |results: &[PredicateResult]| -> Vec<PredicateResult> {
            results
                .iter()
                .map(|r| r.clone_with_source(source, base_target_path, base_value_path))
                .collect()
        };
        match self {
            PredicateResult::PathValue(r) => PredicateResult::PathValue(PathValueResult {
                predicate: r.predicate.clone(),
                location: rebase(&r.location),
                valid: r.valid,
            }),
            PredicateResult::TypeMismatch(r) => PredicateResult::TypeMismatch(TypeMismatchError {
                expected: r.expected,
                actual: r.actual,
                location: rebase(&r.location),
            }),
            PredicateResult::MissingPath(r) => PredicateResult::MissingPath(MissingPathError {
                location: rebase(&r.location),
            }),
            PredicateResult::UnexpectedPath(r) => {
                PredicateResult::UnexpectedPath(UnexpectedPathError {
                    location: rebase(&r.location),
                })
            }
            PredicateResult::Keyed(r) => PredicateResult::Keyed(KeyedPredicateResult {
                predicate: r.predicate.clone(),
                location: rebase(&r.location),
                results: r
                    .results
                    .iter()
                    .map(|entry| KeyedEntry {
                        key: entry.key.clone(),
                        result: entry.result.clone_with_source(
                            source,
                            base_target_path,
                            base_value_path,
                        ),
                    })
                    .collect(),
                valid: r.valid,
            }),
            PredicateResult::Sequenced(r) => {
                PredicateResult::Sequenced(SequencedPredicateResult {
                    predicate: r.predicate.clone(),
                    location: rebase(&r.location),
                    results: rebase_all(&r.results),
                    valid: r.valid,
                })
            }
            PredicateResult::Map(r) => PredicateResult::Map(MapPredicateResult {
                predicate: r.predicate.clone(),
                location: rebase(&r.location),
                results: rebase_all(&r.results),
                good_count: r.good_count,
                max: r.max,
                valid: r.valid,
            }),
        }
    }

    /// Every failing leaf in the tree, depth first.
    ///
    /// Aggregates are descended into; a failing aggregate whose entries all
    /// pass (e.g. a map predicate with too many witnesses) is itself a leaf.
    pub fn failures(&self) -> Vec<&PredicateResult> {
        let mut out = Vec::new();
        self.collect_failures(&mut out);
        out
    }

    fn collect_failures<'a>(&'a self, out: &mut Vec<&'a PredicateResult>) {
        if self.is_valid() {
            return;
        }
        let before = out.len();
        match self {
            PredicateResult::Keyed(r) => {
                for entry in &r.results {
                    entry.result.collect_failures(out);
                }
            }
            PredicateResult::Sequenced(r) => {
                for child in &r.results {
                    child.collect_failures(out);
                }
            }
            PredicateResult::Map(r) if r.good_count == 0 => {
                for child in &r.results {
                    child.collect_failures(out);
                }
            }
            _ => {}
        }
        if out.len() == before {
            out.push(self);
        }
    }
}

impl From<TypeMismatchError> for PredicateResult {
    fn from(r: TypeMismatchError) -> Self {
        PredicateResult::TypeMismatch(r)
    }
}

impl From<MissingPathError> for PredicateResult {
    fn from(r: MissingPathError) -> Self {
        PredicateResult::MissingPath(r)
    }
}

impl From<UnexpectedPathError> for PredicateResult {
    fn from(r: UnexpectedPathError) -> Self {
        PredicateResult::UnexpectedPath(r)
    }
}

impl From<KeyedPredicateResult> for PredicateResult {
    fn from(r: KeyedPredicateResult) -> Self {
        PredicateResult::Keyed(r)
    }
}

impl From<SequencedPredicateResult> for PredicateResult {
    fn from(r: SequencedPredicateResult) -> Self {
        PredicateResult::Sequenced(r)
    }
}

impl From<MapPredicateResult> for PredicateResult {
    fn from(r: MapPredicateResult) -> Self {
        PredicateResult::Map(r)
    }
}

// ──────────────────────────────────────────────
// Builders
// ──────────────────────────────────────────────

/// Accumulates per-field results for an Object match.
#[derive(Debug)]
pub struct KeyedPredicateResultBuilder {
    predicate: PredicateLabel,
    source: Value,
    results: Vec<KeyedEntry>,
}

impl KeyedPredicateResultBuilder {
    pub fn new(predicate: PredicateLabel, source: &Value) -> Self {
        KeyedPredicateResultBuilder {
            predicate,
            source: source.clone(),
            results: Vec::new(),
        }
    }

    /// Record the result for `key`, replacing any earlier entry for it.
    pub fn add_result(&mut self, key: impl Into<String>, result: PredicateResult) -> &mut Self {
        let key = key.into();
        match self.results.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.result = result,
            None => self.results.push(KeyedEntry { key, result }),
        }
        self
    }

    /// Merge a batch of keyed results.
    pub fn update_results<I>(&mut self, results: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, PredicateResult)>,
    {
        for (key, result) in results {
            self.add_result(key, result);
        }
        self
    }

    pub fn build(self, valid: bool) -> KeyedPredicateResult {
        KeyedPredicateResult {
            predicate: self.predicate,
            location: ResultLocation::root(&self.source),
            results: self.results,
            valid,
        }
    }
}

/// Accumulates per-pattern results for an Array match.
#[derive(Debug)]
pub struct SequencedPredicateResultBuilder {
    predicate: PredicateLabel,
    source: Value,
    results: Vec<PredicateResult>,
}

impl SequencedPredicateResultBuilder {
    pub fn new(predicate: PredicateLabel, source: &Value) -> Self {
        SequencedPredicateResultBuilder {
            predicate,
            source: source.clone(),
            results: Vec::new(),
        }
    }

    pub fn append_result(&mut self, result: PredicateResult) -> &mut Self {
        self.results.push(result);
        self
    }

    pub fn extend_results<I>(&mut self, results: I) -> &mut Self
    where
        I: IntoIterator<Item = PredicateResult>,
    {
        self.results.extend(results);
        self
    }

    pub fn build(self, valid: bool) -> SequencedPredicateResult {
        SequencedPredicateResult {
            predicate: self.predicate,
            location: ResultLocation::root(&self.source),
            results: self.results,
            valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label(name: &str) -> PredicateLabel {
        PredicateLabel {
            name: name.to_string(),
            display: name.to_string(),
        }
    }

    fn missing(source: &Value, path: &str) -> PredicateResult {
        MissingPathError {
            location: ResultLocation::new(source, path, PathValue::new("", source.clone())),
        }
        .into()
    }

    #[test]
    fn error_kinds_are_never_valid() {
        let v = json!(1);
        assert!(!PredicateResult::from(TypeMismatchError::new(
            JsonType::String,
            JsonType::Number,
            &v
        ))
        .is_valid());
        assert!(!missing(&v, "x").is_valid());
    }

    #[test]
    fn keyed_builder_validity_is_explicit() {
        let source = json!({"a": 1});
        let mut builder = KeyedPredicateResultBuilder::new(label("Matches"), &source);
        builder.add_result("a", PredicateResult::comparison(label("=="), &json!(1), true));
        // Validity is whatever the caller decides, even with all entries passing.
        let result = builder.build(false);
        assert!(!result.valid);
        assert!(result.get("a").unwrap().is_valid());
        assert!(result.get("b").is_none());
    }

    #[test]
    fn keyed_builder_update_replaces_and_appends() {
        let source = json!({"a": 1, "b": 2});
        let mut builder = KeyedPredicateResultBuilder::new(label("Matches"), &source);
        builder.add_result("a", PredicateResult::comparison(label("=="), &json!(1), true));
        builder.update_results(vec![
            ("a".to_string(), missing(&source, "a")),
            ("b".to_string(), missing(&source, "b")),
        ]);
        let result = builder.build(false);
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(result.get("a").unwrap().kind(), "missing_path");
    }

    #[test]
    fn sequenced_builder_keeps_order() {
        let source = json!([1, 2]);
        let mut builder = SequencedPredicateResultBuilder::new(label("Matches"), &source);
        builder.append_result(PredicateResult::comparison(label("p1"), &source, true));
        builder.extend_results(vec![missing(&source, "[1]")]);
        let result = builder.build(true);
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[1].target_path(), "[1]");
    }

    #[test]
    fn clone_with_source_prefixes_paths() {
        let inner = json!([1, 2]);
        let outer = json!({"list": [1, 2]});
        let result = PredicateResult::comparison(label("has-subset"), &inner, false);
        let moved = result.clone_with_source(&outer, "list", "list");
        assert_eq!(moved.source(), &outer);
        assert_eq!(moved.target_path(), "list");
        assert_eq!(moved.path_value().path, "list");
        assert_eq!(moved.path_value().value, inner);
    }

    #[test]
    fn failures_descend_into_aggregates() {
        let source = json!({"a": 1, "b": 2});
        let mut builder = KeyedPredicateResultBuilder::new(label("Matches"), &source);
        builder.add_result("a", PredicateResult::comparison(label("=="), &json!(1), true));
        builder.add_result("b", missing(&source, "b"));
        let result: PredicateResult = builder.build(false).into();
        let failures = result.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].target_path(), "b");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let v = json!("x");
        let result: PredicateResult =
            TypeMismatchError::new(JsonType::Number, JsonType::String, &v).into();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "type_mismatch");
        assert_eq!(json["expected"], "Number");
        assert_eq!(json["target_path"], "");
        assert_eq!(json["path_value"]["value"], "x");
    }
}
