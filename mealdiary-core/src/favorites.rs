//! Favorite foods.
//!
//! [`FavoritesState`] is the local set of liked food IDs that every view
//! shares. [`FavoriteToggle`] updates it optimistically and rolls it back
//! when the store write fails.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{DiaryError, DiaryResult};
use crate::models::{FavFood, Food};
use crate::path;
use crate::store::{decode, encode, Query, SharedStore};

/// Observable set of liked food IDs. Clones share the same state.
#[derive(Debug, Clone)]
pub struct FavoritesState {
    tx: Arc<watch::Sender<BTreeSet<String>>>,
}

impl Default for FavoritesState {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BTreeSet::new());
        Self { tx: Arc::new(tx) }
    }

    pub fn is_liked(&self, food_id: &str) -> bool {
        self.tx.borrow().contains(food_id)
    }

    pub fn liked(&self) -> BTreeSet<String> {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Receiver notified on every membership change.
    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<String>> {
        self.tx.subscribe()
    }

    /// Adds or removes `food_id`. Returns whether membership changed.
    fn set(&self, food_id: &str, liked: bool) -> bool {
        self.tx.send_if_modified(|ids| {
            if liked {
                ids.insert(food_id.to_string())
            } else {
                ids.remove(food_id)
            }
        })
    }

    fn replace(&self, ids: BTreeSet<String>) {
        self.tx.send_replace(ids);
    }
}

/// Likes and unlikes foods for a user.
#[derive(Clone)]
pub struct FavoriteToggle {
    store: SharedStore,
    state: FavoritesState,
}

impl FavoriteToggle {
    pub fn new(store: SharedStore) -> Self {
        Self::with_state(store, FavoritesState::new())
    }

    pub fn with_state(store: SharedStore, state: FavoritesState) -> Self {
        Self { store, state }
    }

    pub fn state(&self) -> &FavoritesState {
        &self.state
    }

    pub fn is_liked(&self, food_id: &str) -> bool {
        self.state.is_liked(food_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<String>> {
        self.state.subscribe()
    }

    /// Replaces the local state with the user's stored favorites.
    pub async fn load(&self, user_id: &str) -> DiaryResult<usize> {
        let snapshots = self.store.query(&Query::new(path::fav_foods(user_id)?)).await?;
        let ids: BTreeSet<String> = snapshots.iter().map(|s| s.id().to_string()).collect();
        let count = ids.len();
        self.state.replace(ids);
        tracing::debug!(user_id, count, "loaded favorites");
        Ok(count)
    }

    /// Likes a food from the shared catalog.
    pub async fn like(&self, user_id: &str, food_id: &str) -> DiaryResult<()> {
        let catalog_path = path::food(food_id)?;
        let food: Food = match self.store.get(&catalog_path).await? {
            Some(value) => decode(&catalog_path, value)?,
            None => {
                return Err(DiaryError::NotFound {
                    kind: "food",
                    id: food_id.to_string(),
                })
            }
        };
        self.like_food(user_id, food).await
    }

    /// Likes `food` without consulting the catalog.
    pub async fn like_food(&self, user_id: &str, food: Food) -> DiaryResult<()> {
        let fav_path = path::fav_food(user_id, &food.food_id)?;
        let food_id = food.food_id.clone();
        let record = encode(&fav_path, &FavFood::new(food))?;

        let changed = self.state.set(&food_id, true);
        if let Err(e) = self.store.set(&fav_path, record).await {
            if changed {
                self.state.set(&food_id, false);
            }
            tracing::warn!(user_id, food_id = %food_id, error = %e, "like failed, rolled back");
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn unlike(&self, user_id: &str, food_id: &str) -> DiaryResult<()> {
        let fav_path = path::fav_food(user_id, food_id)?;

        let changed = self.state.set(food_id, false);
        if let Err(e) = self.store.delete(&fav_path).await {
            if changed {
                self.state.set(food_id, true);
            }
            tracing::warn!(user_id, food_id, error = %e, "unlike failed, rolled back");
            return Err(e.into());
        }
        Ok(())
    }

    /// Flips the liked state of `food_id`. Returns the new state.
    pub async fn toggle(&self, user_id: &str, food_id: &str) -> DiaryResult<bool> {
        if self.is_liked(food_id) {
            self.unlike(user_id, food_id).await?;
            Ok(false)
        } else {
            self.like(user_id, food_id).await?;
            Ok(true)
        }
    }
}
