use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{RemoteError, RemoteStore, SelectQuery};

type Row = Map<String, Value>;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    unique: HashMap<String, Vec<Vec<String>>>,
}

/// Process-local store honoring per-collection uniqueness constraints.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique constraint over `columns` of `collection`.
    pub fn with_unique(self, collection: &str, columns: &[&str]) -> Self {
        self.lock()
            .unique
            .entry(collection.to_string())
            .or_default()
            .push(columns.iter().map(|column| column.to_string()).collect());
        self
    }

    /// Preload rows, bypassing constraints. Non-object values are skipped.
    pub fn with_rows<I>(self, collection: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        {
            let mut tables = self.lock();
            let table = tables.rows.entry(collection.to_string()).or_default();
            table.extend(rows.into_iter().filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            }));
        }
        self
    }

    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.lock()
            .rows
            .get(collection)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn violated_constraint<'a>(
    constraints: &'a [Vec<String>],
    existing: &[Row],
    candidate: &Row,
) -> Option<&'a [String]> {
    constraints
        .iter()
        .find(|columns| {
            existing.iter().any(|row| {
                columns
                    .iter()
                    .all(|column| row.get(column) == candidate.get(column))
            })
        })
        .map(Vec::as_slice)
}

fn compare_cells(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|value| !value.is_null());
    let right = right.filter(|value| !value.is_null());
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        // nulls sort last, matching PostgreSQL ascending order
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn insert(&self, collection: &str, record: Value) -> Result<(), RemoteError> {
        let Value::Object(mut row) = record else {
            return Err(RemoteError::Decode(format!(
                "{collection} rows must be JSON objects"
            )));
        };

        let mut tables = self.lock();
        let constraints = tables.unique.get(collection).cloned().unwrap_or_default();
        let table = tables.rows.entry(collection.to_string()).or_default();

        if let Some(columns) = violated_constraint(&constraints, table, &row) {
            return Err(RemoteError::DuplicateKey(format!(
                "duplicate key value violates unique constraint \"{}_{}_key\"",
                collection,
                columns.join("_")
            )));
        }

        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        table.push(row);
        Ok(())
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        let mut rows = self
            .lock()
            .rows
            .get(&query.collection)
            .cloned()
            .unwrap_or_default();

        if let Some(column) = &query.order_by {
            rows.sort_by(|a, b| compare_cells(a.get(column), b.get(column)));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                if query.columns.is_empty() {
                    return Value::Object(row);
                }
                let projected = query
                    .columns
                    .iter()
                    .filter_map(|column| {
                        row.get(column)
                            .map(|value| (column.clone(), value.clone()))
                    })
                    .collect::<Row>();
                Value::Object(projected)
            })
            .collect())
    }
}
