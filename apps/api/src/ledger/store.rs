use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Named groups of documents in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Runs,
    Candidates,
    Interviews,
    PracticeInterviews,
    Feedback,
    Statistics,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Runs => "runs",
            Collection::Candidates => "candidates",
            Collection::Interviews => "interviews",
            Collection::PracticeInterviews => "practice_interviews",
            Collection::Feedback => "feedback",
            Collection::Statistics => "statistics",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot serve this filtered/ordered query, typically because
    /// the composite index it needs does not exist.
    #[error("query not supported by the store: {0}")]
    QueryUnsupported(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Equality filter on one top-level field, optionally newest-first by `createdAt`.
#[derive(Debug, Clone)]
pub struct Query {
    pub field: &'static str,
    pub equals: Value,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl Query {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Query {
            field,
            equals: value.into(),
            newest_first: false,
            limit: None,
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The filter value as the text form a JSON `->>` projection yields.
    pub fn equals_text(&self) -> String {
        match &self.equals {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        doc.get(self.field) == Some(&self.equals)
    }

    /// Filters, orders and limits documents in memory. This is the scan path
    /// used when the store cannot serve the query directly.
    pub fn apply(&self, docs: Vec<Value>) -> Vec<Value> {
        let mut matched: Vec<Value> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if self.newest_first {
            matched.sort_by(|a, b| compare_created_at(b, a));
        }
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

fn created_at(doc: &Value) -> Option<DateTime<Utc>> {
    doc.get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Orders documents by parsed `createdAt`; undated documents sort first.
pub fn compare_created_at(a: &Value, b: &Value) -> Ordering {
    created_at(a).cmp(&created_at(b))
}

/// A JSON document store keyed by (collection, id).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates or replaces a document.
    async fn put(&self, collection: Collection, id: &str, doc: Value) -> Result<(), StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn query(&self, collection: Collection, query: &Query)
        -> Result<Vec<Value>, StoreError>;

    /// Every document in the collection, in no particular order.
    async fn scan(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;
}
