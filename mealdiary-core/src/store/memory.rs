//! In-memory document store.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use super::{apply_update, evaluate, merge_json, ChangeFeed, DocumentStore, Query, Snapshot};
use crate::error::{StoreError, StoreResult};
use crate::path::DocPath;

/// Document store held in memory.
///
/// Documents are kept in path order, which gives queries without an
/// explicit ordering document-ID order within a collection. Clones share
/// the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    docs: RwLock<BTreeMap<DocPath, Value>>,
    feed: ChangeFeed,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set`/`merge`/`update`/`delete` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail with a backend error, to exercise
    /// callers' failure paths.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of live change-feed receivers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.feed.subscriber_count()
    }

    pub async fn len(&self) -> usize {
        self.inner.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.docs.read().await.is_empty()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend(io::Error::new(
                io::ErrorKind::Other,
                "writes are disabled",
            )));
        }
        Ok(())
    }

    fn committed(&self, path: &DocPath) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.feed.publish(path);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        Ok(self.inner.docs.read().await.get(path).cloned())
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>> {
        let docs = self.inner.docs.read().await;
        let candidates = docs
            .iter()
            .filter(|(path, _)| query.collection.contains(path))
            .map(|(path, data)| (path.clone(), data.clone()));
        Ok(evaluate(query, candidates))
    }

    async fn set(&self, path: &DocPath, value: Value) -> StoreResult<()> {
        self.check_writable()?;
        self.inner.docs.write().await.insert(path.clone(), value);
        self.committed(path);
        Ok(())
    }

    async fn merge(&self, path: &DocPath, partial: Value) -> StoreResult<()> {
        self.check_writable()?;
        {
            let mut docs = self.inner.docs.write().await;
            let doc = docs
                .entry(path.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            merge_json(doc, partial);
        }
        self.committed(path);
        Ok(())
    }

    async fn update(&self, path: &DocPath, patch: Value) -> StoreResult<()> {
        self.check_writable()?;
        {
            let mut docs = self.inner.docs.write().await;
            let doc = docs
                .get_mut(path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            apply_update(doc, patch);
        }
        self.committed(path);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.check_writable()?;
        self.inner.docs.write().await.remove(path);
        self.committed(path);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<DocPath> {
        self.inner.feed.subscribe()
    }
}
