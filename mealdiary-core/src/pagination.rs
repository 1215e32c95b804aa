//! Cursor-based page loading for "load more" lists.

use serde::de::DeserializeOwned;

use crate::error::StoreResult;
use crate::store::{Cursor, DocumentStore, Query};

/// Accumulates pages of a query, remembering where the last page ended.
///
/// Items are kept with their document IDs so they can be dropped again
/// (e.g. after an un-favorite) without reloading.
#[derive(Debug, Clone)]
pub struct PageTracker<T> {
    query: Query,
    cursor: Option<Cursor>,
    items: Vec<(String, T)>,
    has_next: bool,
    loading: bool,
}

impl<T: DeserializeOwned> PageTracker<T> {
    /// Tracker over `query`. Any limit or start position already on the
    /// query is replaced per page.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            cursor: None,
            items: Vec::new(),
            has_next: true,
            loading: false,
        }
    }

    /// Fetches up to `page_size` items after the last loaded one and
    /// appends them. Returns how many were fetched.
    ///
    /// A zero `page_size` fetches nothing and ends the listing.
    pub async fn load_next(
        &mut self,
        store: &dyn DocumentStore,
        page_size: usize,
    ) -> StoreResult<usize> {
        self.loading = true;
        let result = self.fetch(store, page_size).await;
        self.loading = false;
        let fetched = result?;
        self.has_next = page_size > 0 && fetched == page_size;
        Ok(fetched)
    }

    async fn fetch(&mut self, store: &dyn DocumentStore, page_size: usize) -> StoreResult<usize> {
        let query = self
            .query
            .clone()
            .limit(page_size)
            .start_after(self.cursor.clone());
        let snapshots = store.query(&query).await?;

        // Decode everything before touching state so a bad document leaves
        // the tracker where it was.
        let mut page = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            page.push((snapshot.id().to_string(), snapshot.decode::<T>()?));
        }

        if let Some(last) = snapshots.last() {
            self.cursor = Some(last.cursor(&self.query.order_by));
        }
        let fetched = page.len();
        self.items.extend(page);
        tracing::debug!(
            collection = %self.query.collection,
            fetched,
            total = self.items.len(),
            "loaded page"
        );
        Ok(fetched)
    }
}

impl<T> PageTracker<T> {
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, item)| item)
    }

    pub fn entries(&self) -> &[(String, T)] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Drops the loaded item with document ID `id`. Returns whether one was
    /// removed. The cursor is unaffected.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|(item_id, _)| item_id != id);
        self.items.len() != before
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.items.clear();
        self.has_next = true;
        self.loading = false;
    }
}
