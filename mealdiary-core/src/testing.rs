//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::collaborators::{DiaryContext, Navigator, Notifier};
use crate::error::{StoreError, StoreResult};
use crate::path::DocPath;
use crate::store::{DocumentStore, MemoryStore, Query, Snapshot};

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, _duration: Duration) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        self.visits.lock().unwrap().push(path.to_string());
    }

    fn go_back(&self) {
        self.visits.lock().unwrap().push("<back>".to_string());
    }
}

/// Memory store that counts `get` calls per path.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    gets: Arc<Mutex<HashMap<DocPath, usize>>>,
}

impl CountingStore {
    pub fn gets(&self, path: &DocPath) -> usize {
        self.gets.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        *self.gets.lock().unwrap().entry(path.clone()).or_default() += 1;
        self.inner.get(path).await
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>> {
        self.inner.query(query).await
    }

    async fn set(&self, path: &DocPath, value: Value) -> StoreResult<()> {
        self.inner.set(path, value).await
    }

    async fn merge(&self, path: &DocPath, partial: Value) -> StoreResult<()> {
        self.inner.merge(path, partial).await
    }

    async fn update(&self, path: &DocPath, patch: Value) -> StoreResult<()> {
        self.inner.update(path, patch).await
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.inner.delete(path).await
    }

    fn changes(&self) -> broadcast::Receiver<DocPath> {
        self.inner.changes()
    }
}

/// Memory store whose queries fail with a backend error.
#[derive(Clone, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        self.inner.get(path).await
    }

    async fn query(&self, _query: &Query) -> StoreResult<Vec<Snapshot>> {
        Err(StoreError::backend(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        )))
    }

    async fn set(&self, path: &DocPath, value: Value) -> StoreResult<()> {
        self.inner.set(path, value).await
    }

    async fn merge(&self, path: &DocPath, partial: Value) -> StoreResult<()> {
        self.inner.merge(path, partial).await
    }

    async fn update(&self, path: &DocPath, patch: Value) -> StoreResult<()> {
        self.inner.update(path, patch).await
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.inner.delete(path).await
    }

    fn changes(&self) -> broadcast::Receiver<DocPath> {
        self.inner.changes()
    }
}

pub struct TestContext {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub ctx: DiaryContext,
}

pub fn test_context() -> TestContext {
    let store = MemoryStore::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let ctx = DiaryContext::new(Arc::new(store.clone()))
        .with_notifier(notifier.clone())
        .with_navigator(navigator.clone());
    TestContext {
        store,
        notifier,
        navigator,
        ctx,
    }
}
