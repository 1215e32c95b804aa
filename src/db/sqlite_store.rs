use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::broadcast;

use mealdiary_core::store::{apply_update, evaluate, merge_json, ChangeFeed, DocumentStore};
use mealdiary_core::{DocPath, Query, Snapshot, StoreError, StoreResult};

/// Document store persisted in SQLite as one JSON row per document.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    async fn read_in(
        tx: &mut Transaction<'_, Sqlite>,
        path: &DocPath,
    ) -> StoreResult<Option<Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM documents WHERE path = ?")
            .bind(path.as_str())
            .fetch_optional(&mut **tx)
            .await
            .map_err(StoreError::backend)?;
        row.map(|(data,)| parse(path, &data)).transpose()
    }

    async fn write_in(
        tx: &mut Transaction<'_, Sqlite>,
        path: &DocPath,
        value: &Value,
    ) -> StoreResult<()> {
        let data = serde_json::to_string(value).map_err(|e| StoreError::serialization(path, e))?;
        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, data, updated_at)
            VALUES (?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(path.as_str())
        .bind(path.parent().as_str())
        .bind(&data)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(StoreError::backend)
    }

    async fn commit(&self, tx: Transaction<'static, Sqlite>, path: &DocPath) -> StoreResult<()> {
        tx.commit().await.map_err(StoreError::backend)?;
        self.feed.publish(path);
        Ok(())
    }
}

fn parse(path: &DocPath, data: &str) -> StoreResult<Value> {
    serde_json::from_str(data).map_err(|e| StoreError::serialization(path, e))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM documents WHERE path = ?")
            .bind(path.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        row.map(|(data,)| parse(path, &data)).transpose()
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT path, data FROM documents WHERE collection = ? ORDER BY path",
        )
        .bind(query.collection.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        let mut docs = Vec::with_capacity(rows.len());
        for (path, data) in rows {
            let path = DocPath::parse(&path)?;
            let value = parse(&path, &data)?;
            docs.push((path, value));
        }
        tracing::debug!(collection = %query.collection, candidates = docs.len(), "sqlite query");
        Ok(evaluate(query, docs))
    }

    async fn set(&self, path: &DocPath, value: Value) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        Self::write_in(&mut tx, path, &value).await?;
        self.commit(tx, path).await
    }

    async fn merge(&self, path: &DocPath, partial: Value) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        let mut doc = Self::read_in(&mut tx, path)
            .await?
            .unwrap_or_else(|| Value::Object(Default::default()));
        merge_json(&mut doc, partial);
        Self::write_in(&mut tx, path, &doc).await?;
        self.commit(tx, path).await
    }

    async fn update(&self, path: &DocPath, patch: Value) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        let mut doc = Self::read_in(&mut tx, path)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.clone()))?;
        apply_update(&mut doc, patch);
        Self::write_in(&mut tx, path, &doc).await?;
        self.commit(tx, path).await
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM documents WHERE path = ?")
            .bind(path.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;
        self.commit(tx, path).await
    }

    fn changes(&self) -> broadcast::Receiver<DocPath> {
        self.feed.subscribe()
    }
}
