//! Chainable query evaluation over collection snapshots.

use std::cmp::Ordering;

use serde_json::Value;

use crate::{DocStore, DocStoreError, DocStoreResult, Document};

/// One step of a query chain.
#[derive(Debug, Clone)]
pub(crate) enum QueryStep {
    /// Keep rows whose `column` equals `value`.
    FilterEq { column: String, value: Value },
    /// Sort rows by `column`.
    OrderBy { column: String, ascending: bool },
    /// Truncate to the first `n` rows.
    Limit(usize),
}

/// A lazily evaluated query over one collection.
///
/// The builder is an immutable value: each call returns a new query with
/// the step appended, and nothing touches storage until a terminal method
/// runs. Steps are applied to the snapshot strictly in the order they
/// were attached, so a `limit` placed before an `order_by` truncates
/// first.
#[derive(Clone)]
pub struct Query<'a> {
    store: &'a DocStore,
    collection: String,
    steps: Vec<QueryStep>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(store: &'a DocStore, collection: String) -> Self {
        Self {
            store,
            collection,
            steps: Vec::new(),
        }
    }

    /// Keeps rows where `column` equals `value` (strict JSON equality;
    /// a missing column never matches). Multiple filters AND together.
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.steps.push(QueryStep::FilterEq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Sorts rows by `column`.
    ///
    /// Rows with equal keys carry no ordering guarantee.
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.steps.push(QueryStep::OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Truncates to the first `n` rows at this point in the chain.
    pub fn limit(mut self, n: usize) -> Self {
        self.steps.push(QueryStep::Limit(n));
        self
    }

    /// Evaluates the chain and returns all matching rows.
    ///
    /// An empty result is `Ok(vec![])`, not an error.
    pub async fn fetch(self) -> DocStoreResult<Vec<Document>> {
        self.store.emulate_read_latency().await;
        let rows = self.store.load(&self.collection);
        Ok(apply_steps(rows, &self.steps))
    }

    /// Evaluates the chain and returns the first row, if any.
    pub async fn fetch_optional(self) -> DocStoreResult<Option<Document>> {
        Ok(self.fetch().await?.into_iter().next())
    }

    /// Evaluates the chain and returns exactly one row.
    pub async fn fetch_one(self) -> DocStoreResult<Document> {
        let collection = self.collection.clone();
        self.fetch()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocStoreError::not_found(collection))
    }
}

pub(crate) fn apply_steps(mut rows: Vec<Document>, steps: &[QueryStep]) -> Vec<Document> {
    for step in steps {
        match step {
            QueryStep::FilterEq { column, value } => {
                rows.retain(|row| row.get(column) == Some(value));
            }
            QueryStep::OrderBy { column, ascending } => {
                rows.sort_unstable_by(|a, b| {
                    let ord = compare_columns(a.get(column), b.get(column));
                    if *ascending { ord } else { ord.reverse() }
                });
            }
            QueryStep::Limit(n) => rows.truncate(*n),
        }
    }
    rows
}

/// Compares two column values; a missing column sorts before any value.
fn compare_columns(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

/// Total order over JSON values.
///
/// Values of different kinds order as null < bool < number < string <
/// array < object; arrays and objects compare by their serialized form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
