use chrono::NaiveDate;
use futures::StreamExt;

use crate::collaborators::DiaryContext;
use crate::document_id::create_id;
use crate::error::{DiaryResult, StoreResult};
use crate::models::{check_range, BodyUpdate, DailyInfo, MealEntry, MealSource, MealType};
use crate::path;
use crate::store::{decode, encode, watch_document, Direction, FilterOp, LiveStream, Query};

/// Number of days listed by [`DailyInfoService::recent`].
pub const RECENT_DAYS: usize = 7;

/// Largest amount a single meal entry may carry.
pub const MAX_MEAL_AMOUNT: f64 = 10000.0;

const EDITOR_ROUTE: &str = "editor-list";

#[derive(Clone)]
pub struct DailyInfoService {
    ctx: DiaryContext,
}

impl DailyInfoService {
    pub fn new(ctx: DiaryContext) -> Self {
        Self { ctx }
    }

    /// The most recent daily infos, newest first.
    pub async fn recent(&self, user_id: &str) -> DiaryResult<Vec<DailyInfo>> {
        let query = Query::new(path::daily_infos(user_id)?)
            .order_by("date", Direction::Desc)
            .limit(RECENT_DAYS);
        let snapshots = self.ctx.store.query(&query).await?;
        let infos = snapshots
            .iter()
            .map(|s| s.decode::<DailyInfo>())
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(infos)
    }

    pub async fn get(&self, user_id: &str, date: NaiveDate) -> DiaryResult<Option<DailyInfo>> {
        let doc_path = path::daily_info(user_id, date)?;
        match self.ctx.store.get(&doc_path).await? {
            Some(value) => Ok(Some(decode(&doc_path, value)?)),
            None => Ok(None),
        }
    }

    pub fn watch(&self, user_id: &str, date: NaiveDate) -> DiaryResult<LiveStream<Option<DailyInfo>>> {
        let doc_path = path::daily_info(user_id, date)?;
        let decode_path = doc_path.clone();
        Ok(watch_document(self.ctx.store.clone(), doc_path)
            .map(move |item| {
                item.and_then(|value| value.map(|v| decode(&decode_path, v)).transpose())
            })
            .boxed())
    }

    /// Looks the day up by its `date` field rather than its path.
    pub async fn find_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> DiaryResult<Option<DailyInfo>> {
        let query = Query::new(path::daily_infos(user_id)?)
            .where_eq("date", date.to_string())
            .limit(1);
        let snapshots = self.ctx.store.query(&query).await?;
        match snapshots.first() {
            Some(snapshot) => Ok(Some(snapshot.decode()?)),
            None => Ok(None),
        }
    }

    /// Creates the day if it does not exist yet, then opens the meal editor.
    ///
    /// Returns whether a document was written.
    pub async fn create(&self, user_id: &str, date: NaiveDate) -> DiaryResult<bool> {
        let doc_path = path::daily_info(user_id, date)?;
        let created = if self.ctx.store.get(&doc_path).await?.is_some() {
            tracing::debug!(user_id, %date, "daily info already exists");
            false
        } else {
            let info = DailyInfo::new(create_id(), user_id, date);
            self.ctx.store.set(&doc_path, encode(&doc_path, &info)?).await?;
            true
        };
        self.ctx.navigator.go_to(EDITOR_ROUTE);
        Ok(created)
    }

    /// Merges weight, body fat and memo into the day's document.
    pub async fn update_body(&self, body: &BodyUpdate) -> DiaryResult<()> {
        body.validate()?;
        let doc_path = path::daily_info(&body.author_id, body.date)?;
        self.ctx.store.merge(&doc_path, encode(&doc_path, body)?).await?;
        self.ctx.notify("Updated");
        Ok(())
    }

    /// Latest day before `date` that recorded a weight.
    pub async fn previous_body(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> DiaryResult<Option<DailyInfo>> {
        let query = Query::new(path::daily_infos(user_id)?)
            .filter("date", FilterOp::Lt, date.to_string())
            .order_by("date", Direction::Desc);
        let snapshots = self.ctx.store.query(&query).await?;
        for snapshot in &snapshots {
            let info: DailyInfo = snapshot.decode()?;
            if info.current_weight.is_some() {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    pub async fn add_meal(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        source: MealSource,
        amount: f64,
    ) -> DiaryResult<MealEntry> {
        check_range("amount", amount, 0.0, MAX_MEAL_AMOUNT)?;
        let entry = MealEntry {
            meal_id: create_id(),
            amount,
            source,
        };
        let doc_path = path::meal(user_id, date, meal_type, &entry.meal_id)?;
        self.ctx.store.set(&doc_path, encode(&doc_path, &entry)?).await?;
        self.ctx.notify("Added");
        Ok(entry)
    }

    pub async fn delete_meal(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        meal_id: &str,
    ) -> DiaryResult<()> {
        let doc_path = path::meal(user_id, date, meal_type, meal_id)?;
        self.ctx.store.delete(&doc_path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::{DiaryError, ValidationError};
    use crate::models::Food;
    use crate::store::DocumentStore;
    use crate::testing::test_context;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn body(date: NaiveDate, weight: f64) -> BodyUpdate {
        BodyUpdate {
            author_id: "u1".into(),
            date,
            current_weight: weight,
            current_fat: 20.0,
            daily_memo: None,
        }
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());

        assert!(service.create("u1", day(1)).await.unwrap());
        let writes = t.store.write_count();
        let first = service.get("u1", day(1)).await.unwrap().unwrap();

        assert!(!service.create("u1", day(1)).await.unwrap());
        assert_eq!(t.store.write_count(), writes);
        assert_eq!(t.store.len().await, 1);
        assert_eq!(service.get("u1", day(1)).await.unwrap().unwrap(), first);
        assert_eq!(t.navigator.visits(), vec!["editor-list", "editor-list"]);
    }

    #[tokio::test]
    async fn test_update_body_merges_and_notifies() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        service.create("u1", day(2)).await.unwrap();
        let daily_id = service.get("u1", day(2)).await.unwrap().unwrap().daily_id;

        let mut update = body(day(2), 61.5);
        update.daily_memo = Some("walked".into());
        service.update_body(&update).await.unwrap();

        let info = service.get("u1", day(2)).await.unwrap().unwrap();
        assert_eq!(info.daily_id, daily_id);
        assert_eq!(info.current_weight, Some(61.5));
        assert_eq!(info.daily_memo.as_deref(), Some("walked"));
        assert_eq!(t.notifier.messages(), vec!["Updated"]);
    }

    #[tokio::test]
    async fn test_update_body_rejects_out_of_range() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        let result = service.update_body(&body(day(2), 250.0)).await;
        assert!(matches!(
            result,
            Err(DiaryError::Validation(ValidationError::OutOfRange { field: "currentWeight", .. }))
        ));
        assert_eq!(t.store.write_count(), 0);
        assert!(t.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_capped() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        for d in 1..=9 {
            service.create("u1", day(d)).await.unwrap();
        }

        let recent = service.recent("u1").await.unwrap();
        let dates: Vec<NaiveDate> = recent.iter().map(|i| i.date).collect();
        assert_eq!(dates, (3..=9).rev().map(day).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_find_by_date() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        service.create("u1", day(4)).await.unwrap();

        assert_eq!(service.find_by_date("u1", day(4)).await.unwrap().unwrap().date, day(4));
        assert!(service.find_by_date("u1", day(5)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_previous_body_skips_days_without_weight() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        service.update_body(&body(day(1), 60.0)).await.unwrap();
        service.create("u1", day(2)).await.unwrap();
        service.update_body(&body(day(5), 59.0)).await.unwrap();

        let previous = service.previous_body("u1", day(3)).await.unwrap().unwrap();
        assert_eq!(previous.current_weight, Some(60.0));
        assert!(service.previous_body("u1", day(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_and_delete_meal() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());

        let entry = service
            .add_meal("u1", day(1), MealType::Lunch, MealSource::Food(Food::new("f1", "Rice")), 150.0)
            .await
            .unwrap();
        let doc_path = path::meal("u1", day(1), MealType::Lunch, &entry.meal_id).unwrap();
        let stored = t.store.get(&doc_path).await.unwrap().unwrap();
        assert_eq!(stored["mealId"], entry.meal_id.as_str());
        assert_eq!(stored["food"]["name"], "Rice");
        assert_eq!(t.notifier.messages(), vec!["Added"]);

        service
            .delete_meal("u1", day(1), MealType::Lunch, &entry.meal_id)
            .await
            .unwrap();
        assert!(t.store.get(&doc_path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_meal_rejects_bad_amount() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        let result = service
            .add_meal("u1", day(1), MealType::Dinner, MealSource::Set("s1".into()), 10001.0)
            .await;
        assert!(matches!(result, Err(DiaryError::Validation(_))));
        assert_eq!(t.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_watch_follows_updates() {
        let t = test_context();
        let service = DailyInfoService::new(t.ctx.clone());
        let mut live = service.watch("u1", day(6)).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(2), live.next()).await.unwrap();
        assert!(matches!(first, Some(Ok(None))));

        service.update_body(&body(day(6), 58.0)).await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.map(|i| i.current_weight), Some(Some(58.0)));
    }
}
