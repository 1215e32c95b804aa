//! Live subscriptions over a store's change feed.
//!
//! A watch emits the current value first, then re-reads after every write
//! that touches what it watches. Bursts of writes are coalesced into one
//! re-read, and a lagging receiver re-reads instead of failing.

use futures::stream::{self, BoxStream, Fuse, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Query, SharedStore, Snapshot};
use crate::error::StoreResult;
use crate::path::DocPath;

pub type LiveStream<T> = BoxStream<'static, StoreResult<T>>;

/// Waits until a relevant path is published. Returns false once the feed is
/// closed.
async fn wait_for_change<F>(rx: &mut broadcast::Receiver<DocPath>, relevant: F) -> bool
where
    F: Fn(&DocPath) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(path) if relevant(&path) => break,
            Ok(_) => continue,
            Err(RecvError::Lagged(_)) => break,
            Err(RecvError::Closed) => return false,
        }
    }
    // Coalesce whatever else is already queued; the re-read covers it.
    loop {
        match rx.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Closed) => return false,
        }
    }
}

struct WatchState<K> {
    store: SharedStore,
    key: K,
    rx: broadcast::Receiver<DocPath>,
    started: bool,
}

/// Live value of one document (`None` while it does not exist).
pub fn watch_document(store: SharedStore, path: DocPath) -> LiveStream<Option<serde_json::Value>> {
    // Subscribe before the first read so no write slips in between.
    let rx = store.changes();
    let state = WatchState {
        store,
        key: path,
        rx,
        started: false,
    };
    stream::unfold(state, |mut state| async move {
        if state.started {
            let path = state.key.clone();
            if !wait_for_change(&mut state.rx, |changed| *changed == path).await {
                return None;
            }
        }
        state.started = true;
        tracing::debug!(path = %state.key, "reading watched document");
        let item = state.store.get(&state.key).await;
        Some((item, state))
    })
    .boxed()
}

/// Live result of a query; re-runs on any write directly inside the
/// queried collection.
pub fn watch_query(store: SharedStore, query: Query) -> LiveStream<Vec<Snapshot>> {
    let rx = store.changes();
    let state = WatchState {
        store,
        key: query,
        rx,
        started: false,
    };
    stream::unfold(state, |mut state| async move {
        if state.started {
            let collection = state.key.collection.clone();
            if !wait_for_change(&mut state.rx, |changed| collection.contains(changed)).await {
                return None;
            }
        }
        state.started = true;
        tracing::debug!(collection = %state.key.collection, "running watched query");
        let item = state.store.query(&state.key).await;
        Some((item, state))
    })
    .boxed()
}

/// Emits the latest value of every input once all of them have produced one,
/// and again whenever any of them changes.
///
/// An empty input emits a single empty vector. Errors from any input are
/// forwarded as they arrive.
pub fn combine_latest<T>(streams: Vec<LiveStream<T>>) -> LiveStream<Vec<T>>
where
    T: Clone + Send + 'static,
{
    if streams.is_empty() {
        return stream::once(async { Ok(Vec::new()) }).boxed();
    }

    let latest: Vec<Option<T>> = vec![None; streams.len()];
    let indexed = stream::select_all(
        streams
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.map(move |item| (i, item)).boxed()),
    );

    stream::unfold((indexed, latest), |(mut indexed, mut latest)| async move {
        loop {
            let (i, item) = indexed.next().await?;
            match item {
                Err(e) => return Some((Err(e), (indexed, latest))),
                Ok(value) => {
                    latest[i] = Some(value);
                    if let Some(all) = latest.iter().cloned().collect::<Option<Vec<T>>>() {
                        return Some((Ok(all), (indexed, latest)));
                    }
                }
            }
        }
    })
    .boxed()
}

async fn next_inner<B>(inner: &mut Option<Fuse<LiveStream<B>>>) -> Option<StoreResult<B>> {
    match inner {
        Some(stream) => stream.next().await,
        None => futures::future::pending().await,
    }
}

/// Maps each outer value to an inner stream and forwards only the most
/// recent inner stream; the previous one is dropped when the outer emits.
pub fn switch_map<A, B, F>(outer: LiveStream<A>, f: F) -> LiveStream<B>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> LiveStream<B> + Send + 'static,
{
    let inner: Option<Fuse<LiveStream<B>>> = None;
    stream::unfold((outer.fuse(), inner, f), |(mut outer, mut inner, f)| async move {
        loop {
            tokio::select! {
                item = outer.next() => match item {
                    None => return None,
                    Some(Err(e)) => return Some((Err(e), (outer, inner, f))),
                    Some(Ok(value)) => inner = Some(f(value).fuse()),
                },
                Some(item) = next_inner(&mut inner) => {
                    return Some((item, (outer, inner, f)));
                }
            }
        }
    })
    .boxed()
}

/// Handle on a live stream driven by a background task.
///
/// Dropping the handle or calling [`Subscription::dispose`] cancels the task
/// and every store watch it holds.
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Spawns a task forwarding `stream` into the subscription. Must be
    /// called within a tokio runtime.
    pub fn spawn(stream: BoxStream<'static, T>) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(async move {
            let mut stream = stream;
            while let Some(item) = stream.next().await {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        Self { rx, task }
    }

    /// Next emitted value, `None` after the stream ended or was disposed.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn dispose(self) {
        self.task.abort();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::path::CollectionPath;
    use crate::store::{DocumentStore, MemoryStore};
    use serde_json::json;

    async fn next<T>(stream: &mut LiveStream<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("stream timed out")
            .expect("stream ended")
            .expect("store error")
    }

    #[tokio::test]
    async fn test_watch_document_emits_current_then_changes() {
        let store = MemoryStore::new();
        let path = DocPath::parse("foods/f1").unwrap();
        let mut live = watch_document(Arc::new(store.clone()), path.clone());

        assert_eq!(next(&mut live).await, None);

        store.set(&path, json!({"name": "Rice"})).await.unwrap();
        assert_eq!(next(&mut live).await, Some(json!({"name": "Rice"})));
    }

    #[tokio::test]
    async fn test_watch_query_ignores_other_collections() {
        let store = MemoryStore::new();
        let sets = CollectionPath::parse("users/u1/sets").unwrap();
        let mut live = watch_query(Arc::new(store.clone()), Query::new(sets.clone()));
        assert!(next(&mut live).await.is_empty());

        store
            .set(&DocPath::parse("users/u1/favFoods/x").unwrap(), json!({}))
            .await
            .unwrap();
        store.set(&sets.doc("s1").unwrap(), json!({"n": 1})).await.unwrap();

        let snapshots = next(&mut live).await;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id(), "s1");
    }

    #[tokio::test]
    async fn test_combine_latest_waits_for_all() {
        let a: LiveStream<i32> = stream::iter(vec![Ok(1), Ok(2)]).boxed();
        let b: LiveStream<i32> = stream::iter(vec![Ok(10)]).boxed();
        let combined: Vec<Vec<i32>> = combine_latest(vec![a, b])
            .map(|r| r.unwrap())
            .collect()
            .await;
        // Every emission has a value from both inputs.
        assert!(combined.iter().all(|v| v.len() == 2));
        assert_eq!(combined.last(), Some(&vec![2, 10]));
    }

    #[tokio::test]
    async fn test_combine_latest_empty() {
        let combined: Vec<_> = combine_latest::<i32>(Vec::new()).collect().await;
        assert_eq!(combined.len(), 1);
        assert!(combined[0].as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switch_map_follows_latest_outer() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<StoreResult<i32>>();
        let mut results = switch_map(rx.boxed(), |n| {
            stream::once(async move { Ok(n * 100) })
                .chain(stream::pending())
                .boxed()
        });

        tx.unbounded_send(Ok(1)).unwrap();
        assert_eq!(next(&mut results).await, 100);

        tx.unbounded_send(Ok(2)).unwrap();
        assert_eq!(next(&mut results).await, 200);
    }

    #[tokio::test]
    async fn test_subscription_dispose_stops_forwarding() {
        let store = MemoryStore::new();
        let path = DocPath::parse("foods/f1").unwrap();
        let mut sub = Subscription::spawn(watch_document(Arc::new(store.clone()), path.clone()));

        let first = tokio::time::timeout(Duration::from_secs(2), sub.next()).await.unwrap();
        assert!(matches!(first, Some(Ok(None))));

        assert_eq!(store.subscriber_count(), 1);
        sub.dispose();
        for _ in 0..100 {
            if store.subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.subscriber_count(), 0);
    }
}
