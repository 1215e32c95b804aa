use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::food::Food;
use super::meal_type::MealType;
use super::nutrition::Nutrition;

/// One food inside a set, with the amount eaten in grams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetFood {
    pub food: Food,
    pub amount: f64,
}

impl SetFood {
    pub fn new(food: Food, amount: f64) -> Self {
        Self { food, amount }
    }
}

/// A user-defined bundle of foods usable as a single meal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealSet {
    pub set_id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub breakfast: bool,
    #[serde(default)]
    pub lunch: bool,
    #[serde(default)]
    pub dinner: bool,
    #[serde(default)]
    pub foods: Vec<SetFood>,
    /// Sole sort key for listings, stored as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl MealSet {
    pub fn new(
        set_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            set_id: set_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            breakfast: false,
            lunch: false,
            dinner: false,
            foods: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_foods(mut self, foods: Vec<SetFood>) -> Self {
        self.foods = foods;
        self
    }

    pub fn with_meal(mut self, meal_type: MealType) -> Self {
        self.set_flag(meal_type, true);
        self
    }

    pub fn applies_to(&self, meal_type: MealType) -> bool {
        match meal_type {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
        }
    }

    pub fn set_flag(&mut self, meal_type: MealType, value: bool) {
        match meal_type {
            MealType::Breakfast => self.breakfast = value,
            MealType::Lunch => self.lunch = value,
            MealType::Dinner => self.dinner = value,
        }
    }

    /// Sum of every constituent food for its amount.
    pub fn nutrition(&self) -> Nutrition {
        self.foods
            .iter()
            .map(|item| item.food.nutrition.for_amount(item.amount))
            .fold(Nutrition::default(), |acc, n| acc + n)
    }
}

/// Fields supplied by the caller when creating a set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealSet {
    pub user_id: String,
    pub name: String,
    pub meals: Vec<MealType>,
    pub foods: Vec<SetFood>,
}

impl fmt::Display for MealSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.set_id)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;

        let meals: Vec<&str> = MealType::ALL
            .iter()
            .filter(|m| self.applies_to(**m))
            .map(|m| m.as_str())
            .collect();
        if !meals.is_empty() {
            writeln!(f, "Meals: {}", meals.join(", "))?;
        }

        if !self.foods.is_empty() {
            writeln!(f, "\nFoods:")?;
            for item in &self.foods {
                writeln!(f, "  - {} g {}", item.amount, item.food.name)?;
            }
        }

        writeln!(f, "\nTotal:")?;
        for line in self.nutrition().to_string().lines() {
            writeln!(f, "  - {}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rice() -> Food {
        Food::new("rice", "Rice").with_nutrition(Nutrition {
            calories: 168.0,
            protein: 2.5,
            ..Default::default()
        })
    }

    #[test]
    fn test_flags() {
        let mut set = MealSet::new("s1", "u1", "Morning").with_meal(MealType::Breakfast);
        assert!(set.applies_to(MealType::Breakfast));
        assert!(!set.applies_to(MealType::Dinner));

        set.set_flag(MealType::Breakfast, false);
        assert!(!set.applies_to(MealType::Breakfast));
    }

    #[test]
    fn test_nutrition_totals() {
        let set = MealSet::new("s1", "u1", "Bowl").with_foods(vec![
            SetFood::new(rice(), 200.0),
            SetFood::new(rice(), 50.0),
        ]);
        let total = set.nutrition();
        assert_eq!(total.calories, 168.0 * 2.5);
        assert_eq!(total.protein, 2.5 * 2.5);
    }

    #[test]
    fn test_updated_at_is_millis() {
        let set = MealSet::new("s1", "u1", "Bowl");
        let value = serde_json::to_value(&set).unwrap();
        assert!(value["updatedAt"].is_i64());
        assert_eq!(value["setId"], "s1");
    }

    #[test]
    fn test_display() {
        let set = MealSet::new("s1", "u1", "Bowl")
            .with_meal(MealType::Lunch)
            .with_foods(vec![SetFood::new(rice(), 150.0)]);
        let output = format!("{}", set);
        assert!(output.contains("Meals: lunch"));
        assert!(output.contains("150 g Rice"));
    }
}
