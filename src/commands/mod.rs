mod config_cmd;
mod day;
mod food;
mod meal;
mod recipe;
mod set;

pub use config_cmd::ConfigCommand;
pub use day::DayCommand;
pub use food::FoodCommand;
pub use meal::MealCommand;
pub use recipe::RecipeCommand;
pub use set::SetCommand;

use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::ValueEnum;

use mealdiary_core::Notifier;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints notifications to stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, _duration: Duration) {
        println!("{}", message);
    }
}

/// Parses a YYYY-MM-DD argument, defaulting to today.
pub fn parse_date(date: &Option<String>) -> Result<NaiveDate, String> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", d)),
        None => Ok(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date(&Some("2025-02-03".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        assert_eq!(parse_date(&None).unwrap(), Local::now().date_naive());

        let err = parse_date(&Some("03/02/2025".to_string())).unwrap_err();
        assert!(err.contains("YYYY-MM-DD"));
    }
}
