mod daily_info;
mod food;
mod meal_entry;
mod meal_set;
mod meal_type;
mod nutrition;
mod recipe;
mod validation;

pub use daily_info::{BodyUpdate, DailyInfo, MAX_FAT, MAX_WEIGHT};
pub use food::{FavFood, Food};
pub use meal_entry::{IntegrityError, MealEntry, MealEntryDocument, MealSource};
pub use meal_set::{MealSet, NewMealSet, SetFood};
pub use meal_type::MealType;
pub use nutrition::Nutrition;
pub use recipe::{
    ProcessStep, Recipe, RecipeDraft, RecipeIngredient, MAX_DESCRIPTION_LENGTH,
    MAX_INGREDIENTS, MAX_INGREDIENT_NAME_LENGTH, MAX_INGREDIENT_UNIT_LENGTH,
    MAX_NUTRITION_AMOUNT, MAX_PROCESSES, MAX_TITLE_LENGTH,
};

pub(crate) use validation::check_range;
