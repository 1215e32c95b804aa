use chrono::Utc;
use futures::StreamExt;
use serde_json::json;

use crate::collaborators::DiaryContext;
use crate::document_id::create_id;
use crate::error::{DiaryError, DiaryResult, StoreResult};
use crate::models::{MealSet, MealType, NewMealSet};
use crate::pagination::PageTracker;
use crate::path;
use crate::store::{
    decode, encode, watch_document, Cursor, Direction, LiveStream, Query, Snapshot,
};

const SET_LIST_ROUTE: &str = "/menu/set-list";

#[derive(Clone)]
pub struct SetService {
    ctx: DiaryContext,
}

impl SetService {
    pub fn new(ctx: DiaryContext) -> Self {
        Self { ctx }
    }

    /// Sets of `user_id`, most recently updated first, optionally only
    /// those applicable to `meal`.
    pub fn list_query(&self, user_id: &str, meal: Option<MealType>) -> DiaryResult<Query> {
        let mut query = Query::new(path::sets(user_id)?).order_by("updatedAt", Direction::Desc);
        if let Some(meal) = meal {
            query = query.where_eq(meal.as_str(), true);
        }
        Ok(query)
    }

    pub fn pager(&self, user_id: &str, meal: Option<MealType>) -> DiaryResult<PageTracker<MealSet>> {
        Ok(PageTracker::new(self.list_query(user_id, meal)?))
    }

    /// One page of sets starting after `cursor`, with the cursor of the last
    /// set returned.
    pub async fn page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<Cursor>,
        meal: Option<MealType>,
    ) -> DiaryResult<(Vec<MealSet>, Option<Cursor>)> {
        let query = self
            .list_query(user_id, meal)?
            .limit(page_size)
            .start_after(cursor);
        let snapshots = self.ctx.store.query(&query).await?;
        let next = snapshots.last().map(|s| s.cursor(&query.order_by));
        let sets = snapshots
            .iter()
            .map(Snapshot::decode::<MealSet>)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((sets, next))
    }

    pub async fn get(&self, user_id: &str, set_id: &str) -> DiaryResult<Option<MealSet>> {
        let doc_path = path::set(user_id, set_id)?;
        match self.ctx.store.get(&doc_path).await? {
            Some(value) => Ok(Some(decode(&doc_path, value)?)),
            None => Ok(None),
        }
    }

    pub fn watch(&self, user_id: &str, set_id: &str) -> DiaryResult<LiveStream<Option<MealSet>>> {
        let doc_path = path::set(user_id, set_id)?;
        let decode_path = doc_path.clone();
        Ok(watch_document(self.ctx.store.clone(), doc_path)
            .map(move |item| {
                item.and_then(|value| value.map(|v| decode(&decode_path, v)).transpose())
            })
            .boxed())
    }

    pub async fn create(&self, new_set: NewMealSet) -> DiaryResult<MealSet> {
        let mut set = MealSet::new(create_id(), new_set.user_id, new_set.name)
            .with_foods(new_set.foods);
        for meal in new_set.meals {
            set.set_flag(meal, true);
        }
        let doc_path = path::set(&set.user_id, &set.set_id)?;
        self.ctx.store.set(&doc_path, encode(&doc_path, &set)?).await?;
        self.ctx.notify("Set created");
        self.ctx.navigator.go_back();
        Ok(set)
    }

    /// Overwrites the stored fields of an existing set and refreshes its
    /// `updated_at`.
    pub async fn update(&self, mut set: MealSet) -> DiaryResult<MealSet> {
        set.updated_at = Utc::now();
        let doc_path = path::set(&set.user_id, &set.set_id)?;
        self.ctx.store.update(&doc_path, encode(&doc_path, &set)?).await?;
        self.ctx.notify("Set updated");
        self.ctx.navigator.go_back();
        Ok(set)
    }

    /// Patches one applicability flag, leaving the rest of the set alone.
    pub async fn set_meal_flag(
        &self,
        user_id: &str,
        set_id: &str,
        meal: MealType,
        value: bool,
    ) -> DiaryResult<()> {
        let doc_path = path::set(user_id, set_id)?;
        self.ctx
            .store
            .update(&doc_path, json!({ meal.as_str(): value }))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, user_id: &str, set_id: &str) -> DiaryResult<()> {
        let doc_path = path::set(user_id, set_id)?;
        let result = self.ctx.store.delete(&doc_path).await;
        match &result {
            Ok(()) => self.ctx.notify("Set deleted"),
            Err(e) => {
                tracing::warn!(user_id, set_id, error = %e, "failed to delete set");
                self.ctx.notify("Failed to delete set");
            }
        }
        self.ctx.navigator.go_to(SET_LIST_ROUTE);
        result.map_err(DiaryError::from)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{Food, SetFood};
    use crate::store::DocumentStore;
    use crate::testing::test_context;

    async fn put(store: &dyn DocumentStore, set: &MealSet) {
        let p = path::set(&set.user_id, &set.set_id).unwrap();
        store.set(&p, encode(&p, set).unwrap()).await.unwrap();
    }

    fn set_at(id: &str, minutes: i64) -> MealSet {
        let mut set = MealSet::new(id, "u1", id);
        set.updated_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(minutes);
        set
    }

    fn new_set(name: &str, meals: Vec<MealType>) -> NewMealSet {
        NewMealSet {
            user_id: "u1".into(),
            name: name.into(),
            meals,
            foods: vec![SetFood::new(Food::new("rice", "Rice"), 150.0)],
        }
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_with_meal_filter() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        put(&t.store, &set_at("a", 1).with_meal(MealType::Breakfast)).await;
        put(&t.store, &set_at("b", 3)).await;
        put(&t.store, &set_at("c", 2).with_meal(MealType::Breakfast)).await;

        let (all, _) = service.page("u1", 10, None, None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.set_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let (breakfast, _) = service
            .page("u1", 10, None, Some(MealType::Breakfast))
            .await
            .unwrap();
        let ids: Vec<&str> = breakfast.iter().map(|s| s.set_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_page_cursor_continues() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            put(&t.store, &set_at(id, i as i64)).await;
        }

        let (first, cursor) = service.page("u1", 2, None, None).await.unwrap();
        assert_eq!(first.len(), 2);
        let (rest, _) = service.page("u1", 2, cursor, None).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].set_id, "a");
    }

    #[tokio::test]
    async fn test_pager_over_sets() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        for i in 0..3 {
            put(&t.store, &set_at(&format!("s{}", i), i)).await;
        }
        let mut pager = service.pager("u1", None).unwrap();
        assert_eq!(pager.load_next(&t.store, 2).await.unwrap(), 2);
        assert_eq!(pager.load_next(&t.store, 2).await.unwrap(), 1);
        assert!(!pager.has_next());
        assert_eq!(pager.items().next().map(|s| s.set_id.as_str()), Some("s2"));
    }

    #[tokio::test]
    async fn test_create_sets_flags_and_goes_back() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        let created = service
            .create(new_set("Morning", vec![MealType::Breakfast, MealType::Lunch]))
            .await
            .unwrap();

        let stored = service.get("u1", &created.set_id).await.unwrap().unwrap();
        assert!(stored.breakfast && stored.lunch && !stored.dinner);
        assert_eq!(stored.foods.len(), 1);
        assert_eq!(t.notifier.messages(), vec!["Set created"]);
        assert_eq!(t.navigator.visits(), vec!["<back>"]);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        let original = set_at("s1", 0);
        put(&t.store, &original).await;

        let mut edited = original.clone();
        edited.name = "Renamed".into();
        let updated = service.update(edited).await.unwrap();
        assert!(updated.updated_at > original.updated_at);

        let stored = service.get("u1", "s1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(t.notifier.messages(), vec!["Set updated"]);
    }

    #[tokio::test]
    async fn test_update_missing_set_fails() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        assert!(service.update(set_at("ghost", 0)).await.is_err());
        assert!(t.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_set_meal_flag_patches_one_field() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        put(&t.store, &set_at("s1", 0).with_meal(MealType::Lunch)).await;

        service
            .set_meal_flag("u1", "s1", MealType::Dinner, true)
            .await
            .unwrap();
        let stored = service.get("u1", "s1").await.unwrap().unwrap();
        assert!(stored.lunch && stored.dinner && !stored.breakfast);
    }

    #[tokio::test]
    async fn test_delete_notifies_and_navigates() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        put(&t.store, &set_at("s1", 0)).await;

        service.delete("u1", "s1").await.unwrap();
        assert!(service.get("u1", "s1").await.unwrap().is_none());
        assert_eq!(t.notifier.messages(), vec!["Set deleted"]);
        assert_eq!(t.navigator.visits(), vec!["/menu/set-list"]);
    }

    #[tokio::test]
    async fn test_delete_failure_still_navigates() {
        let t = test_context();
        let service = SetService::new(t.ctx.clone());
        t.store.fail_writes(true);

        assert!(service.delete("u1", "s1").await.is_err());
        assert_eq!(t.notifier.messages(), vec!["Failed to delete set"]);
        assert_eq!(t.navigator.visits(), vec!["/menu/set-list"]);
    }
}
