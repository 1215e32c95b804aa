use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::food::Food;

/// A stored meal entry that violates the exactly-one-reference rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("meal entry '{0}' references both a food and a set")]
    BothReferences(String),

    #[error("meal entry '{0}' references neither a food nor a set")]
    NoReference(String),
}

/// What a meal entry points at.
#[derive(Debug, Clone, PartialEq)]
pub enum MealSource {
    /// A snapshot of the food at the time it was logged.
    Food(Food),
    /// The ID of a set in `users/{userId}/sets`.
    Set(String),
}

/// A logged consumption record under a date and meal type.
///
/// The document shape carries optional `food` and `setId` fields; exactly one
/// must be present, which conversion from the document enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MealEntryDocument", into = "MealEntryDocument")]
pub struct MealEntry {
    pub meal_id: String,
    pub amount: f64,
    pub source: MealSource,
}

impl MealEntry {
    pub fn food(meal_id: impl Into<String>, amount: f64, food: Food) -> Self {
        Self {
            meal_id: meal_id.into(),
            amount,
            source: MealSource::Food(food),
        }
    }

    pub fn set(meal_id: impl Into<String>, amount: f64, set_id: impl Into<String>) -> Self {
        Self {
            meal_id: meal_id.into(),
            amount,
            source: MealSource::Set(set_id.into()),
        }
    }

    pub fn set_id(&self) -> Option<&str> {
        match &self.source {
            MealSource::Set(id) => Some(id),
            MealSource::Food(_) => None,
        }
    }

    pub fn embedded_food(&self) -> Option<&Food> {
        match &self.source {
            MealSource::Food(food) => Some(food),
            MealSource::Set(_) => None,
        }
    }
}

/// Stored document shape of a meal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntryDocument {
    pub meal_id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<Food>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
}

impl TryFrom<MealEntryDocument> for MealEntry {
    type Error = IntegrityError;

    fn try_from(doc: MealEntryDocument) -> Result<Self, Self::Error> {
        let source = match (doc.food, doc.set_id) {
            (Some(food), None) => MealSource::Food(food),
            (None, Some(set_id)) => MealSource::Set(set_id),
            (Some(_), Some(_)) => return Err(IntegrityError::BothReferences(doc.meal_id)),
            (None, None) => return Err(IntegrityError::NoReference(doc.meal_id)),
        };
        Ok(Self {
            meal_id: doc.meal_id,
            amount: doc.amount,
            source,
        })
    }
}

impl From<MealEntry> for MealEntryDocument {
    fn from(entry: MealEntry) -> Self {
        let (food, set_id) = match entry.source {
            MealSource::Food(food) => (Some(food), None),
            MealSource::Set(set_id) => (None, Some(set_id)),
        };
        Self {
            meal_id: entry.meal_id,
            amount: entry.amount,
            food,
            set_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_entry_document_shape() {
        let value = serde_json::to_value(MealEntry::set("m1", 1.0, "s1")).unwrap();
        assert_eq!(value, json!({"mealId": "m1", "amount": 1.0, "setId": "s1"}));
    }

    #[test]
    fn test_food_entry_parses() {
        let entry: MealEntry = serde_json::from_value(json!({
            "mealId": "m2",
            "amount": 150,
            "food": {"foodId": "f1", "name": "Rice", "calories": 168}
        }))
        .unwrap();
        assert_eq!(entry.embedded_food().unwrap().food_id, "f1");
        assert!(entry.set_id().is_none());
    }

    #[test]
    fn test_both_references_rejected() {
        let doc = MealEntryDocument {
            meal_id: "m3".into(),
            amount: 1.0,
            food: Some(Food::new("f1", "Rice")),
            set_id: Some("s1".into()),
        };
        assert_eq!(
            MealEntry::try_from(doc),
            Err(IntegrityError::BothReferences("m3".into()))
        );
    }

    #[test]
    fn test_no_reference_rejected_by_serde() {
        let result: Result<MealEntry, _> =
            serde_json::from_value(json!({"mealId": "m4", "amount": 1}));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("neither a food nor a set"));
    }
}
