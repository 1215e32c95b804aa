use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use super::validation::check_range;
use crate::error::ValidationError;

/// Macro-nutrient amounts.
///
/// For a [`Food`](super::Food) the values are per 100 g; for a recipe they
/// are the totals of one serving as entered by the author.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub total_carbohydrate: f64,
    pub dietary_fiber: f64,
    pub sugar: f64,
}

impl Nutrition {
    /// Values for `grams` of a food whose nutrition is given per 100 g.
    pub fn for_amount(&self, grams: f64) -> Self {
        self.scaled(grams / 100.0)
    }

    /// Every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            total_carbohydrate: self.total_carbohydrate * factor,
            dietary_fiber: self.dietary_fiber * factor,
            sugar: self.sugar * factor,
        }
    }

    /// Checks every value lies within `min..=max`.
    pub fn validate(&self, min: f64, max: f64) -> Result<(), ValidationError> {
        check_range("calories", self.calories, min, max)?;
        check_range("protein", self.protein, min, max)?;
        check_range("fat", self.fat, min, max)?;
        check_range("totalCarbohydrate", self.total_carbohydrate, min, max)?;
        check_range("dietaryFiber", self.dietary_fiber, min, max)?;
        check_range("sugar", self.sugar, min, max)
    }
}

impl Add for Nutrition {
    type Output = Nutrition;

    fn add(mut self, rhs: Nutrition) -> Nutrition {
        self += rhs;
        self
    }
}

impl AddAssign for Nutrition {
    fn add_assign(&mut self, rhs: Nutrition) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.fat += rhs.fat;
        self.total_carbohydrate += rhs.total_carbohydrate;
        self.dietary_fiber += rhs.dietary_fiber;
        self.sugar += rhs.sugar;
    }
}

impl fmt::Display for Nutrition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "calories: {:.1} kcal", self.calories)?;
        writeln!(f, "protein: {:.1} g", self.protein)?;
        writeln!(f, "fat: {:.1} g", self.fat)?;
        writeln!(f, "carbohydrate: {:.1} g", self.total_carbohydrate)?;
        writeln!(f, "dietary fiber: {:.1} g", self.dietary_fiber)?;
        write!(f, "sugar: {:.1} g", self.sugar)
    }
}
