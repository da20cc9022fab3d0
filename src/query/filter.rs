//! Filter algebra evaluated against document values.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::store::{StoreError, StoreResult};

/// One step of a document path: an object field or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index step.
    Index(usize),
    /// Object field step.
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// Sequence of steps into a document value.
pub type Path = Vec<PathSegment>;

/// Returns the value at `path`, or `None` when any step is missing.
pub fn locate<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = match segment {
            PathSegment::Key(name) => current.as_object()?.get(name)?,
            PathSegment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

/// Query filter over a document value.
///
/// Leaves extract the value at `path` before comparing. Comparisons
/// (`gt`/`gte`/`lt`/`lte`) require both sides to be the same primitive
/// type and otherwise evaluate to false, as does any leaf whose path is
/// missing from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Filter {
    /// All children match. Empty matches everything.
    And(Vec<Filter>),
    /// At least one child matches.
    Or(Vec<Filter>),
    /// Child does not match.
    Not(Box<Filter>),
    /// Leaf is structurally equal to `value`.
    Eq {
        /// Leaf path.
        path: Path,
        /// Comparison operand.
        value: Value,
    },
    /// Leaf is absent or structurally unequal to `value`.
    Ne {
        /// Leaf path.
        path: Path,
        /// Comparison operand.
        value: Value,
    },
    /// Leaf is strictly greater than `value`.
    Gt {
        /// Leaf path.
        path: Path,
        /// Comparison operand.
        value: Value,
    },
    /// Leaf is greater than or equal to `value`.
    Gte {
        /// Leaf path.
        path: Path,
        /// Comparison operand.
        value: Value,
    },
    /// Leaf is strictly less than `value`.
    Lt {
        /// Leaf path.
        path: Path,
        /// Comparison operand.
        value: Value,
    },
    /// Leaf is less than or equal to `value`.
    Lte {
        /// Leaf path.
        path: Path,
        /// Comparison operand.
        value: Value,
    },
    /// Leaf is present.
    Exists {
        /// Leaf path.
        path: Path,
    },
    /// Leaf is exactly `null`.
    IsNull {
        /// Leaf path.
        path: Path,
    },
    /// Leaf is a string matching `pattern`.
    Matches {
        /// Leaf path.
        path: Path,
        /// Regular expression pattern.
        pattern: String,
        /// Case-insensitive matching flag.
        case_insensitive: bool,
    },
    /// Leaf is a string starting with `value`.
    StartsWith {
        /// Leaf path.
        path: Path,
        /// Required prefix.
        value: String,
    },
}

impl Filter {
    /// Parses a filter from its JSON representation.
    ///
    /// An unknown operator is an input error.
    pub fn from_value(raw: Value) -> StoreResult<Filter> {
        serde_json::from_value(raw).map_err(|err| StoreError::Input(format!("bad filter: {err}")))
    }

    /// Evaluates this filter against a single document value.
    ///
    /// A scan evaluating one filter against many documents should share a
    /// [`MatcherCache`] through [`Self::eval_with`] instead, so `matches`
    /// patterns compile once per scan rather than once per document.
    pub fn eval(&self, doc: &Value) -> StoreResult<bool> {
        self.eval_with(doc, &mut MatcherCache::new())
    }

    /// Evaluates this filter, resolving `matches` patterns through
    /// `matchers`.
    pub fn eval_with(&self, doc: &Value, matchers: &mut MatcherCache) -> StoreResult<bool> {
        Ok(match self {
            Filter::And(children) => {
                for child in children {
                    if !child.eval_with(doc, matchers)? {
                        return Ok(false);
                    }
                }
                true
            }
            Filter::Or(children) => {
                for child in children {
                    if child.eval_with(doc, matchers)? {
                        return Ok(true);
                    }
                }
                false
            }
            Filter::Not(child) => !child.eval_with(doc, matchers)?,
            Filter::Eq { path, value } => locate(doc, path) == Some(value),
            Filter::Ne { path, value } => locate(doc, path) != Some(value),
            Filter::Gt { path, value } => {
                compare_leaf(doc, path, value) == Some(Ordering::Greater)
            }
            Filter::Gte { path, value } => matches!(
                compare_leaf(doc, path, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt { path, value } => compare_leaf(doc, path, value) == Some(Ordering::Less),
            Filter::Lte { path, value } => matches!(
                compare_leaf(doc, path, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::Exists { path } => locate(doc, path).is_some(),
            Filter::IsNull { path } => matches!(locate(doc, path), Some(Value::Null)),
            Filter::Matches {
                path,
                pattern,
                case_insensitive,
            } => {
                let regex = matchers.regex_for(pattern, *case_insensitive)?;
                locate(doc, path)
                    .and_then(Value::as_str)
                    .is_some_and(|s| regex.is_match(s))
            }
            Filter::StartsWith { path, value } => locate(doc, path)
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(value)),
        })
    }
}

/// Cache of compiled `matches` patterns, shared across one scan.
///
/// Filters carry only a handful of distinct patterns, so lookup is a
/// linear probe.
#[derive(Debug, Default)]
pub struct MatcherCache {
    compiled: Vec<(String, bool, Regex)>,
}

impl MatcherCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn regex_for(&mut self, pattern: &str, case_insensitive: bool) -> StoreResult<&Regex> {
        let index = match self
            .compiled
            .iter()
            .position(|(p, ci, _)| p.as_str() == pattern && *ci == case_insensitive)
        {
            Some(index) => index,
            None => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|err| StoreError::Input(format!("bad pattern: {err}")))?;
                self.compiled
                    .push((pattern.to_string(), case_insensitive, regex));
                self.compiled.len() - 1
            }
        };
        Ok(&self.compiled[index].2)
    }
}

/// Compares the leaf at `path` with `operand` when both are the same
/// primitive type (number, string, or boolean).
fn compare_leaf(doc: &Value, path: &[PathSegment], operand: &Value) -> Option<Ordering> {
    let leaf = locate(doc, path)?;
    match (leaf, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
