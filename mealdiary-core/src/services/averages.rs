//! Daily calorie totals and trailing averages of calories, weight and body
//! fat.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::aggregation::MealAggregator;
use crate::collaborators::DiaryContext;
use crate::error::{DiaryResult, StoreResult};
use crate::models::{DailyInfo, MealType, Nutrition};
use crate::path;
use crate::store::{Direction, FilterOp, Query};

/// Length of the averaging window, ending at (and including) the given day.
pub const AVERAGE_DAYS: u64 = 7;

/// Averages over the diary days recorded in one window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Diary days found in the window.
    pub days: usize,
    /// Mean of the per-day calorie totals.
    pub total_calories: Option<f64>,
    /// Mean over the days that recorded a weight.
    pub weight: Option<f64>,
    /// Mean over the days that recorded a body fat.
    pub fat: Option<f64>,
}

#[derive(Clone)]
pub struct AverageService {
    ctx: DiaryContext,
}

impl AverageService {
    pub fn new(ctx: DiaryContext) -> Self {
        Self { ctx }
    }

    /// Nutrition eaten on `date` across breakfast, lunch and dinner.
    ///
    /// Every food entry counts only its own food, whatever merge mode the
    /// views use. Entries pointing at deleted sets count nothing.
    pub async fn day_total(&self, user_id: &str, date: NaiveDate) -> DiaryResult<Nutrition> {
        let aggregator = MealAggregator::new(self.ctx.store.clone());
        let mut total = Nutrition::default();
        for meal_type in MealType::ALL {
            for meal in aggregator.resolve(user_id, date, meal_type).await? {
                total += meal.nutrition().unwrap_or_default();
            }
        }
        Ok(total)
    }

    /// Averages over the [`AVERAGE_DAYS`] days ending at `date`.
    ///
    /// Only days with a daily info document take part; a day without meals
    /// counts as zero calories.
    pub async fn averages(&self, user_id: &str, date: NaiveDate) -> DiaryResult<Averages> {
        let from = date
            .checked_sub_days(Days::new(AVERAGE_DAYS - 1))
            .unwrap_or(NaiveDate::MIN);
        let query = Query::new(path::daily_infos(user_id)?)
            .filter("date", FilterOp::Ge, from.to_string())
            .filter("date", FilterOp::Le, date.to_string())
            .order_by("date", Direction::Desc);
        let snapshots = self.ctx.store.query(&query).await?;
        let infos = snapshots
            .iter()
            .map(|s| s.decode::<DailyInfo>())
            .collect::<StoreResult<Vec<_>>>()?;

        let mut calories = Vec::with_capacity(infos.len());
        for info in &infos {
            calories.push(self.day_total(user_id, info.date).await?.calories);
        }

        let averages = Averages {
            from: Some(from),
            to: Some(date),
            days: infos.len(),
            total_calories: mean(calories),
            weight: mean(infos.iter().filter_map(|i| i.current_weight)),
            fat: mean(infos.iter().filter_map(|i| i.current_fat)),
        };
        tracing::debug!(user_id, %date, days = averages.days, "computed averages");
        Ok(averages)
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyUpdate, Food, MealSet, MealSource, SetFood};
    use crate::services::DailyInfoService;
    use crate::store::{encode, DocumentStore};
    use crate::testing::test_context;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    // 200 kcal per 100 g.
    fn rice() -> Food {
        Food::new("rice", "Rice").with_nutrition(Nutrition {
            calories: 200.0,
            protein: 4.0,
            ..Default::default()
        })
    }

    fn body(date: NaiveDate, weight: f64, fat: f64) -> BodyUpdate {
        BodyUpdate {
            author_id: "u1".into(),
            date,
            current_weight: weight,
            current_fat: fat,
            daily_memo: None,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_day_total() {
        let t = test_context();
        let daily = DailyInfoService::new(t.ctx.clone());
        let averages = AverageService::new(t.ctx.clone());

        // 50 g of rice: 100 kcal per serving.
        let set = MealSet::new("s1", "u1", "Half rice").with_foods(vec![SetFood::new(rice(), 50.0)]);
        let set_path = path::set("u1", "s1").unwrap();
        t.store.set(&set_path, encode(&set_path, &set).unwrap()).await.unwrap();

        let cases: Vec<(&str, Vec<(MealType, MealSource, f64)>, f64)> = vec![
            ("nothing logged", vec![], 0.0),
            (
                "single food",
                vec![(MealType::Breakfast, MealSource::Food(rice()), 150.0)],
                300.0,
            ),
            (
                "foods and sets across meals",
                vec![
                    (MealType::Breakfast, MealSource::Food(rice()), 50.0),
                    (MealType::Lunch, MealSource::Set("s1".into()), 2.0),
                    (MealType::Dinner, MealSource::Food(rice()), 100.0),
                ],
                100.0 + 200.0 + 200.0,
            ),
            (
                "deleted set counts nothing",
                vec![
                    (MealType::Lunch, MealSource::Set("gone".into()), 1.0),
                    (MealType::Lunch, MealSource::Set("s1".into()), 0.5),
                ],
                50.0,
            ),
        ];

        for (i, (name, entries, expected)) in cases.into_iter().enumerate() {
            let date = day(i as u32 + 1);
            for (meal_type, source, amount) in entries {
                daily.add_meal("u1", date, meal_type, source, amount).await.unwrap();
            }
            let total = averages.day_total("u1", date).await.unwrap();
            assert!(close(total.calories, expected), "{}: {}", name, total.calories);
        }
    }

    #[tokio::test]
    async fn test_day_total_sums_every_nutrient() {
        let t = test_context();
        let daily = DailyInfoService::new(t.ctx.clone());
        daily
            .add_meal("u1", day(1), MealType::Dinner, MealSource::Food(rice()), 250.0)
            .await
            .unwrap();

        let total = AverageService::new(t.ctx.clone()).day_total("u1", day(1)).await.unwrap();
        assert!(close(total.calories, 500.0));
        assert!(close(total.protein, 10.0));
        assert!(close(total.fat, 0.0));
    }

    #[tokio::test]
    async fn test_averages_over_window() {
        let t = test_context();
        let daily = DailyInfoService::new(t.ctx.clone());
        let service = AverageService::new(t.ctx.clone());

        // Outside the window on both sides.
        daily.update_body(&body(day(2), 90.0, 40.0)).await.unwrap();
        daily.update_body(&body(day(10), 90.0, 40.0)).await.unwrap();

        daily.update_body(&body(day(4), 60.0, 20.0)).await.unwrap();
        daily
            .add_meal("u1", day(4), MealType::Lunch, MealSource::Food(rice()), 100.0)
            .await
            .unwrap();
        daily.update_body(&body(day(6), 62.0, 22.0)).await.unwrap();
        daily.create("u1", day(8)).await.unwrap();
        daily
            .add_meal("u1", day(8), MealType::Dinner, MealSource::Food(rice()), 50.0)
            .await
            .unwrap();
        // Meals without a daily info document are not a diary day.
        daily
            .add_meal("u1", day(7), MealType::Dinner, MealSource::Food(rice()), 500.0)
            .await
            .unwrap();

        let averages = service.averages("u1", day(9)).await.unwrap();
        assert_eq!(averages.from, Some(day(3)));
        assert_eq!(averages.to, Some(day(9)));
        assert_eq!(averages.days, 3);
        assert!(close(averages.total_calories.unwrap(), (200.0 + 0.0 + 100.0) / 3.0));
        assert!(close(averages.weight.unwrap(), 61.0));
        assert!(close(averages.fat.unwrap(), 21.0));
    }

    #[tokio::test]
    async fn test_averages_without_days() {
        let t = test_context();
        let averages = AverageService::new(t.ctx.clone()).averages("u1", day(9)).await.unwrap();
        assert_eq!(averages.days, 0);
        assert_eq!(averages.total_calories, None);
        assert_eq!(averages.weight, None);
        assert_eq!(averages.fat, None);
    }

    #[tokio::test]
    async fn test_days_without_body_do_not_dilute_weight() {
        let t = test_context();
        let daily = DailyInfoService::new(t.ctx.clone());
        daily.create("u1", day(1)).await.unwrap();
        daily.update_body(&body(day(2), 58.0, 18.0)).await.unwrap();

        let averages = AverageService::new(t.ctx.clone()).averages("u1", day(2)).await.unwrap();
        assert_eq!(averages.days, 2);
        assert_eq!(averages.weight, Some(58.0));
        assert_eq!(averages.total_calories, Some(0.0));
    }
}
