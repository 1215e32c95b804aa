use crate::collaborators::DiaryContext;
use crate::document_id::create_id;
use crate::error::{DiaryError, DiaryResult};
use crate::favorites::{FavoriteToggle, FavoritesState};
use crate::models::{FavFood, Food, Nutrition};
use crate::pagination::PageTracker;
use crate::path;
use crate::store::{decode, encode, Query};

/// The shared food catalog and a user's favorites.
#[derive(Clone)]
pub struct FoodService {
    ctx: DiaryContext,
    favorites: FavoriteToggle,
}

impl FoodService {
    pub fn new(ctx: DiaryContext) -> Self {
        Self::with_favorites(ctx, FavoritesState::new())
    }

    /// Service whose favorite toggles update `state`, typically one shared
    /// with other views.
    pub fn with_favorites(ctx: DiaryContext, state: FavoritesState) -> Self {
        let favorites = FavoriteToggle::with_state(ctx.store.clone(), state);
        Self { ctx, favorites }
    }

    pub async fn create(&self, name: &str, nutrition: Nutrition) -> DiaryResult<Food> {
        let food = Food::new(create_id(), name).with_nutrition(nutrition);
        self.put(&food).await?;
        Ok(food)
    }

    /// Writes `food` to the catalog under its own ID.
    pub async fn put(&self, food: &Food) -> DiaryResult<()> {
        let doc_path = path::food(&food.food_id)?;
        self.ctx.store.set(&doc_path, encode(&doc_path, food)?).await?;
        Ok(())
    }

    pub async fn get(&self, food_id: &str) -> DiaryResult<Option<Food>> {
        let doc_path = path::food(food_id)?;
        match self.ctx.store.get(&doc_path).await? {
            Some(value) => Ok(Some(decode(&doc_path, value)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get), but a missing food is an error.
    pub async fn require(&self, food_id: &str) -> DiaryResult<Food> {
        self.get(food_id).await?.ok_or_else(|| DiaryError::NotFound {
            kind: "food",
            id: food_id.to_string(),
        })
    }

    pub fn favorites(&self) -> &FavoriteToggle {
        &self.favorites
    }

    /// Favorites of `user_id` in storage order.
    pub fn favorites_pager(&self, user_id: &str) -> DiaryResult<PageTracker<FavFood>> {
        Ok(PageTracker::new(Query::new(path::fav_foods(user_id)?)))
    }
}
