use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::ledger::store::{Collection, DocumentStore, Query, StoreError};

/// SQLSTATE raised by Postgres-wire stores that reject the JSON-path query shape.
const FEATURE_NOT_SUPPORTED: &str = "0A000";
const UNDEFINED_FUNCTION: &str = "42883";

/// Document store backed by a single JSONB table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url` and ensures the schema.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the documents table and its lookup indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (name, field) in [
            ("documents_run_id_idx", "runId"),
            ("documents_email_idx", "email"),
            ("documents_user_id_idx", "userId"),
            ("documents_interview_id_idx", "interviewId"),
            ("documents_event_ref_idx", "schedulingEventRef"),
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name} ON documents (collection, (data->>'{field}'), created_at DESC)"
            ))
            .execute(&self.pool)
            .await?;
        }

        info!("Document store schema ready");
        Ok(())
    }
}

fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if let Some(code) = db.code() {
            if code == FEATURE_NOT_SUPPORTED || code == UNDEFINED_FUNCTION {
                return StoreError::QueryUnsupported(db.message().to_string());
            }
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn put(&self, collection: Collection, id: &str, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection.name())
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(
            sqlx::query_scalar::<_, Value>("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.name())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Value>, StoreError> {
        let order = if query.newest_first {
            "ORDER BY created_at DESC"
        } else {
            ""
        };
        let sql = format!(
            "SELECT data FROM documents WHERE collection = $1 AND data->>$2 = $3 {order} LIMIT $4"
        );
        let limit = query.limit.map(|l| l as i64).unwrap_or(i64::MAX);

        sqlx::query_scalar::<_, Value>(&sql)
            .bind(collection.name())
            .bind(query.field)
            .bind(query.equals_text())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        Ok(
            sqlx::query_scalar::<_, Value>("SELECT data FROM documents WHERE collection = $1")
                .bind(collection.name())
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
