//! Meal Diary Core Library
//!
//! Models, document store access and the services behind the meal diary:
//! daily meal aggregation, cursor-based listings, favorites, sets and
//! recipes.

pub mod aggregation;
pub mod collaborators;
pub mod document_id;
pub mod error;
pub mod favorites;
pub mod models;
pub mod pagination;
pub mod path;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregation::{MealAggregator, MealKind, MealValue, MergeMode, ResolvedMeal};
pub use collaborators::{
    DiaryContext, Navigator, Notifier, TracingNavigator, TracingNotifier, NOTIFY_DURATION,
};
pub use document_id::{create_id, DocumentId};
pub use error::{DiaryError, DiaryResult, StoreError, StoreResult, ValidationError};
pub use favorites::{FavoriteToggle, FavoritesState};
pub use models::{
    BodyUpdate, DailyInfo, FavFood, Food, IntegrityError, MealEntry, MealSet, MealSource,
    MealType, NewMealSet, Nutrition, ProcessStep, Recipe, RecipeDraft, RecipeIngredient, SetFood,
};
pub use pagination::PageTracker;
pub use path::{CollectionPath, DocPath, PathError};
pub use services::{
    AverageService, Averages, DailyInfoService, FoodService, RecipeService, SetService,
};
pub use store::{
    ChangeFeed, Cursor, Direction, DocumentStore, MemoryStore, Query, SharedStore, Snapshot,
    Subscription,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
