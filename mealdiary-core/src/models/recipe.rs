use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::nutrition::Nutrition;
use super::validation::{check_count, check_len};
use crate::error::ValidationError;

pub const MAX_TITLE_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_INGREDIENT_NAME_LENGTH: usize = 50;
pub const MAX_INGREDIENT_UNIT_LENGTH: usize = 20;
pub const MAX_INGREDIENTS: usize = 100;
pub const MAX_PROCESSES: usize = 30;
pub const MAX_NUTRITION_AMOUNT: f64 = 5000.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub name: String,
    /// Free text such as "2 tbsp" or "a pinch".
    pub amount_and_unit: String,
}

impl RecipeIngredient {
    pub fn new(name: impl Into<String>, amount_and_unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount_and_unit: amount_and_unit.into(),
        }
    }
}

impl fmt::Display for RecipeIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.amount_and_unit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl ProcessStep {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            photo_url: None,
        }
    }
}

/// Recipe content as entered in the editor, before it has an ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub processes: Vec<ProcessStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl RecipeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            nutrition: Nutrition::default(),
            public: false,
            ingredients: Vec::new(),
            processes: Vec::new(),
            thumbnail_url: None,
        }
    }

    pub fn with_ingredients(mut self, ingredients: Vec<RecipeIngredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_processes(mut self, processes: Vec<ProcessStep>) -> Self {
        self.processes = processes;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, 1, MAX_TITLE_LENGTH)?;
        check_len("description", &self.description, 0, MAX_DESCRIPTION_LENGTH)?;
        check_count("ingredients", self.ingredients.len(), 1, MAX_INGREDIENTS)?;
        for ingredient in &self.ingredients {
            check_len("ingredient name", &ingredient.name, 1, MAX_INGREDIENT_NAME_LENGTH)?;
            check_len(
                "ingredient amount",
                &ingredient.amount_and_unit,
                1,
                MAX_INGREDIENT_UNIT_LENGTH,
            )?;
        }
        check_count("processes", self.processes.len(), 0, MAX_PROCESSES)?;
        for process in &self.processes {
            check_len("process description", &process.description, 1, MAX_DESCRIPTION_LENGTH)?;
        }
        self.nutrition.validate(0.0, MAX_NUTRITION_AMOUNT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_id: String,
    pub author_id: String,
    #[serde(flatten)]
    pub content: RecipeDraft,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(
        recipe_id: impl Into<String>,
        author_id: impl Into<String>,
        content: RecipeDraft,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            author_id: author_id.into(),
            content,
            updated_at: Utc::now(),
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = &self.content;
        writeln!(f, "{}", content.title)?;
        writeln!(f, "{}", "=".repeat(content.title.chars().count()))?;
        writeln!(f, "Visibility: {}", if content.public { "public" } else { "private" })?;

        if !content.description.is_empty() {
            writeln!(f, "\n{}", content.description)?;
        }

        if !content.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &content.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !content.processes.is_empty() {
            writeln!(f, "\nSteps:")?;
            for (i, step) in content.processes.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step.description)?;
            }
        }

        writeln!(f, "\nNutrition:")?;
        for line in content.nutrition.to_string().lines() {
            writeln!(f, "  - {}", line)?;
        }
        Ok(())
    }
}
