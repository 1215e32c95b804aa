//! Services over the document store.
//!
//! Each service is a thin layer the views call: it builds the paths, writes
//! or reads the documents, then reports back through the context's
//! notifier and navigator.

mod averages;
mod daily_info;
mod foods;
mod recipes;
mod sets;

pub use averages::{AverageService, Averages, AVERAGE_DAYS};
pub use daily_info::{DailyInfoService, MAX_MEAL_AMOUNT, RECENT_DAYS};
pub use foods::FoodService;
pub use recipes::RecipeService;
pub use sets::SetService;
