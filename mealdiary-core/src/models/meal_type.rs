use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three meals of a diary day. The lowercase name is both the
/// subcollection under a daily info and the applicability flag on a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|meal| meal.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown meal '{}'; expected breakfast, lunch or dinner", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!(" Lunch ".parse::<MealType>(), Ok(MealType::Lunch));
        assert_eq!("DINNER".parse::<MealType>(), Ok(MealType::Dinner));
    }

    #[test]
    fn test_parse_rejects_other_meals() {
        let err = "snack".parse::<MealType>().unwrap_err();
        assert!(err.contains("snack"));
        assert!("".parse::<MealType>().is_err());
    }

    #[test]
    fn test_path_segment_matches_wire_name() {
        for meal in MealType::ALL {
            let wire = serde_json::to_value(meal).unwrap();
            assert_eq!(wire, meal.as_str());
            assert_eq!(meal.to_string(), meal.as_str());
        }
    }
}
