//! Hierarchical document store paths.
//!
//! A path alternates collection and document segments:
//! `users/{userId}/sets/{setId}` names a document, `users/{userId}/sets`
//! names a collection. Document paths have an even number of segments,
//! collection paths an odd number.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MealType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Invalid path segment '{segment}' in '{path}'")]
    InvalidSegment { path: String, segment: String },

    #[error("'{0}' is not a document path (expected an even number of segments)")]
    NotADocument(String),

    #[error("'{0}' is not a collection path (expected an odd number of segments)")]
    NotACollection(String),
}

fn split_checked(path: &str) -> Result<Vec<&str>, PathError> {
    let segments: Vec<&str> = path.split('/').collect();
    for segment in &segments {
        if !is_valid_segment(segment) {
            return Err(PathError::InvalidSegment {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        }
    }
    Ok(segments)
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('/')
}

fn check_segment(parent: &str, segment: &str) -> Result<(), PathError> {
    if is_valid_segment(segment) {
        Ok(())
    } else {
        Err(PathError::InvalidSegment {
            path: format!("{}/{}", parent, segment),
            segment: segment.to_string(),
        })
    }
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath(String);

impl DocPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = split_checked(path)?;
        if segments.len() % 2 != 0 {
            return Err(PathError::NotADocument(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The document's own ID (last segment).
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The collection containing this document.
    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(self.0.clone()),
        }
    }

    /// A subcollection nested under this document.
    pub fn collection(&self, name: &str) -> Result<CollectionPath, PathError> {
        check_segment(&self.0, name)?;
        Ok(CollectionPath(format!("{}/{}", self.0, name)))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocPath> for String {
    fn from(path: DocPath) -> Self {
        path.0
    }
}

/// Path of a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = split_checked(path)?;
        if segments.len() % 2 != 1 {
            return Err(PathError::NotACollection(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A document inside this collection.
    pub fn doc(&self, id: &str) -> Result<DocPath, PathError> {
        check_segment(&self.0, id)?;
        Ok(DocPath(format!("{}/{}", self.0, id)))
    }

    /// True if `path` is a direct child document of this collection.
    pub fn contains(&self, path: &DocPath) -> bool {
        path.parent() == *self
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.0
    }
}

fn user(user_id: &str) -> Result<DocPath, PathError> {
    CollectionPath("users".to_string()).doc(user_id)
}

pub fn daily_infos(user_id: &str) -> Result<CollectionPath, PathError> {
    user(user_id)?.collection("dailyInfos")
}

/// `users/{userId}/dailyInfos/{date}`; the date is the document ID.
pub fn daily_info(user_id: &str, date: NaiveDate) -> Result<DocPath, PathError> {
    daily_infos(user_id)?.doc(&date.to_string())
}

pub fn meals(
    user_id: &str,
    date: NaiveDate,
    meal_type: MealType,
) -> Result<CollectionPath, PathError> {
    daily_info(user_id, date)?.collection(meal_type.as_str())
}

pub fn meal(
    user_id: &str,
    date: NaiveDate,
    meal_type: MealType,
    meal_id: &str,
) -> Result<DocPath, PathError> {
    meals(user_id, date, meal_type)?.doc(meal_id)
}

pub fn sets(user_id: &str) -> Result<CollectionPath, PathError> {
    user(user_id)?.collection("sets")
}

pub fn set(user_id: &str, set_id: &str) -> Result<DocPath, PathError> {
    sets(user_id)?.doc(set_id)
}

pub fn fav_foods(user_id: &str) -> Result<CollectionPath, PathError> {
    user(user_id)?.collection("favFoods")
}

pub fn fav_food(user_id: &str, food_id: &str) -> Result<DocPath, PathError> {
    fav_foods(user_id)?.doc(food_id)
}

pub fn foods() -> CollectionPath {
    CollectionPath("foods".to_string())
}

pub fn food(food_id: &str) -> Result<DocPath, PathError> {
    foods().doc(food_id)
}

pub fn recipes() -> CollectionPath {
    CollectionPath("recipes".to_string())
}

pub fn recipe(recipe_id: &str) -> Result<DocPath, PathError> {
    recipes().doc(recipe_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_path_layout() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let path = meal("u1", date, MealType::Lunch, "m1").unwrap();
        assert_eq!(path.as_str(), "users/u1/dailyInfos/2025-03-09/lunch/m1");
        assert_eq!(path.id(), "m1");
        assert_eq!(
            path.parent().as_str(),
            "users/u1/dailyInfos/2025-03-09/lunch"
        );
    }

    #[test]
    fn test_parse_rejects_wrong_parity() {
        assert!(matches!(
            DocPath::parse("users/u1/sets"),
            Err(PathError::NotADocument(_))
        ));
        assert!(matches!(
            CollectionPath::parse("users/u1"),
            Err(PathError::NotACollection(_))
        ));
    }

    #[test]
    fn test_rejects_bad_segments() {
        assert!(DocPath::parse("users//sets/a").is_err());
        assert!(set("u1", "a/b").is_err());
        assert!(set("", "a").is_err());
        assert!(food("..").is_err());
    }

    #[test]
    fn test_collection_contains_only_direct_children() {
        let sets = sets("u1").unwrap();
        assert!(sets.contains(&set("u1", "s1").unwrap()));
        assert!(!sets.contains(&fav_food("u1", "s1").unwrap()));

        let nested = DocPath::parse("users/u1/sets/s1/notes/n1").unwrap();
        assert!(!sets.contains(&nested));
    }

    #[test]
    fn test_serde_validates() {
        let parsed: DocPath = serde_json::from_str("\"foods/f1\"").unwrap();
        assert_eq!(parsed, food("f1").unwrap());
        assert!(serde_json::from_str::<DocPath>("\"foods\"").is_err());
    }
}
