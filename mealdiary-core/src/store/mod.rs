//! Document store access.
//!
//! The store is an external collaborator holding JSON documents under
//! hierarchical paths (see [`crate::path`]). This module defines the
//! [`DocumentStore`] trait every backend implements, the query model with
//! opaque cursors, and the live-subscription plumbing built on each backend's
//! change feed.

mod live;
mod memory;
mod patch;
mod query;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{StoreError, StoreResult};
use crate::path::DocPath;

pub use live::{
    combine_latest, switch_map, watch_document, watch_query, LiveStream, Subscription,
};
pub use memory::MemoryStore;
pub use patch::{apply_update, merge_json};
pub use query::{compare_values, evaluate, Cursor, Direction, Filter, FilterOp, OrderBy, Query};

/// Handle shared by services and live subscriptions.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Client of a hierarchical document database.
///
/// Writes are last-write-wins per document; there are no multi-document
/// transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Reads one document. `Ok(None)` if it does not exist.
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>>;

    /// Runs a query against the documents directly inside a collection.
    async fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>>;

    /// Creates or fully overwrites a document.
    async fn set(&self, path: &DocPath, value: Value) -> StoreResult<()>;

    /// Creates the document or merges `partial` into it, recursing into
    /// nested objects.
    async fn merge(&self, path: &DocPath, partial: Value) -> StoreResult<()>;

    /// Replaces the given top-level fields of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(&self, path: &DocPath, patch: Value) -> StoreResult<()>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &DocPath) -> StoreResult<()>;

    /// Feed of paths written after the call, used by live subscriptions.
    fn changes(&self) -> broadcast::Receiver<DocPath>;
}

/// One document returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: DocPath,
    pub data: Value,
}

impl Snapshot {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        decode(&self.path, self.data.clone())
    }

    /// Position of this snapshot in a query ordered by `order_by`.
    pub fn cursor(&self, order_by: &[OrderBy]) -> Cursor {
        Cursor::at(self, order_by)
    }
}

pub fn decode<T: DeserializeOwned>(path: &DocPath, value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::serialization(path, e))
}

pub fn encode<T: Serialize>(path: &DocPath, value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::serialization(path, e))
}

/// Broadcast channel of written paths.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<DocPath>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn publish(&self, path: &DocPath) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(path.clone());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocPath> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
