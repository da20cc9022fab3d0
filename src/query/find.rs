//! Query shape, result ordering, and pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::{Filter, Path, locate};
use crate::doc::Document;

/// Sort direction of one ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending.
    #[serde(rename = "ASC")]
    Asc,
    /// Descending.
    #[serde(rename = "DESC")]
    Desc,
}

/// One ordering clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Path into the document value.
    pub path: Path,
    /// Sort direction.
    pub direction: Direction,
}

/// Declarative find request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Filter every live document is evaluated against.
    pub filter: Filter,
    /// Maximum number of results, applied after `skip`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Matching documents dropped from the front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    /// Ordering clauses; earlier clauses dominate later ones.
    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order>,
}

impl Query {
    /// Query for `filter` with no ordering or pagination.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            limit: None,
            skip: None,
            order_by: Vec::new(),
        }
    }
}

/// Sorts matches (stable, so ties keep scan order) and slices by
/// `(skip, limit)`.
pub(crate) fn order_and_paginate(mut docs: Vec<Document>, query: &Query) -> Vec<Document> {
    if !query.order_by.is_empty() {
        docs.sort_by(|a, b| compare_documents(a, b, &query.order_by));
    }

    let skipped = docs.into_iter().skip(query.skip.unwrap_or(0));
    match query.limit {
        Some(limit) => skipped.take(limit).collect(),
        None => skipped.collect(),
    }
}

fn compare_documents(a: &Document, b: &Document, orderings: &[Order]) -> Ordering {
    for order in orderings {
        let ord = compare_at_path(locate(&a.value, &order.path), locate(&b.value, &order.path));
        let ord = match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Total order over possibly-missing values: absent sorts below every
/// present value; present values rank null < bool < number < string <
/// array < object, composites falling back to their canonical JSON text.
fn compare_at_path(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    let ranked = type_rank(a).cmp(&type_rank(b));
    if ranked != Ordering::Equal {
        return ranked;
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => canonical_text(a).cmp(&canonical_text(b)),
    }
}

fn canonical_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
