use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::nutrition::Nutrition;

/// A catalog food. Nutrition values are per 100 g.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub food_id: String,
    pub name: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Food {
    pub fn new(food_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            food_id: food_id.into(),
            name: name.into(),
            nutrition: Nutrition::default(),
            thumbnail_url: None,
        }
    }

    pub fn with_nutrition(mut self, nutrition: Nutrition) -> Self {
        self.nutrition = nutrition;
        self
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

impl fmt::Display for Food {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.food_id)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Per 100 g:")?;
        for line in self.nutrition.to_string().lines() {
            writeln!(f, "  - {}", line)?;
        }
        Ok(())
    }
}

/// Membership record under `users/{userId}/favFoods/{foodId}`.
///
/// Embeds the food so a favorites page renders without another lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavFood {
    #[serde(flatten)]
    pub food: Food,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub liked_at: DateTime<Utc>,
}

impl FavFood {
    pub fn new(food: Food) -> Self {
        Self {
            food,
            liked_at: Utc::now(),
        }
    }
}
