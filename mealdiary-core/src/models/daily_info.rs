use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::check_range;
use crate::error::ValidationError;

pub const MAX_WEIGHT: f64 = 200.0;
pub const MAX_FAT: f64 = 100.0;

/// Per-user, per-date record. The date is also the document ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyInfo {
    /// Missing on days first written through a body update.
    #[serde(default)]
    pub daily_id: String,
    pub author_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_memo: Option<String>,
}

impl DailyInfo {
    pub fn new(
        daily_id: impl Into<String>,
        author_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            daily_id: daily_id.into(),
            author_id: author_id.into(),
            date,
            current_weight: None,
            current_fat: None,
            daily_memo: None,
        }
    }
}

impl fmt::Display for DailyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daily Info: {}", self.date)?;
        writeln!(f, "{}", "=".repeat(22))?;
        match self.current_weight {
            Some(weight) => writeln!(f, "Weight: {} kg", weight)?,
            None => writeln!(f, "Weight: -")?,
        }
        match self.current_fat {
            Some(fat) => writeln!(f, "Body fat: {} %", fat)?,
            None => writeln!(f, "Body fat: -")?,
        }
        if let Some(memo) = &self.daily_memo {
            writeln!(f, "\nMemo: {}", memo)?;
        }
        Ok(())
    }
}

/// Partial write of the body measurements of a day.
///
/// Absent fields are left untouched by the merge.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyUpdate {
    pub author_id: String,
    pub date: NaiveDate,
    pub current_weight: f64,
    pub current_fat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_memo: Option<String>,
}

impl BodyUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("currentWeight", self.current_weight, 0.0, MAX_WEIGHT)?;
        check_range("currentFat", self.current_fat, 0.0, MAX_FAT)
    }
}
