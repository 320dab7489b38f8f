use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::ledger::store::{Collection, DocumentStore, Query, StoreError};

/// In-memory document store for tests. `without_indexes` makes every
/// filtered query fail the way a store missing a composite index does;
/// `failing_puts_after(n)` accepts `n` writes and then loses the connection
/// for writes.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<(Collection, String), Value>>,
    reject_queries: bool,
    rejected: AtomicUsize,
    put_budget: Option<usize>,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn without_indexes() -> Self {
        Self {
            reject_queries: true,
            ..Self::default()
        }
    }

    pub fn failing_puts_after(n: usize) -> Self {
        Self {
            put_budget: Some(n),
            ..Self::default()
        }
    }

    pub fn rejected_queries(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub async fn count(&self, collection: Collection) -> usize {
        let guard = self.docs.lock().await;
        guard.keys().filter(|(c, _)| *c == collection).count()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, collection: Collection, id: &str, doc: Value) -> Result<(), StoreError> {
        let attempt = self.puts.fetch_add(1, Ordering::SeqCst);
        if self.put_budget.is_some_and(|budget| attempt >= budget) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut guard = self.docs.lock().await;
        guard.insert((collection, id.to_string()), doc);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let guard = self.docs.lock().await;
        Ok(guard.get(&(collection, id.to_string())).cloned())
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Value>, StoreError> {
        if self.reject_queries {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::QueryUnsupported(format!(
                "no index on {}.{}",
                collection.name(),
                query.field
            )));
        }
        Ok(query.apply(self.scan(collection).await?))
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let guard = self.docs.lock().await;
        Ok(guard
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

/// A configured store whose backend is down: every call times out.
pub struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn put(&self, _: Collection, _: &str, _: Value) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn get(&self, _: Collection, _: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn query(&self, _: Collection, _: &Query) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn scan(&self, _: Collection) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
