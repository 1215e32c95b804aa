use clap::{ArgGroup, Args, Subcommand};

use mealdiary_core::{
    DailyInfoService, DiaryContext, FoodService, MealAggregator, MealSource, MealType, MealValue,
    MergeMode, ResolvedMeal,
};

use super::{parse_date, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Add a food or a set to a meal
    #[command(group(ArgGroup::new("source").required(true).args(["food", "set"])))]
    Add {
        /// Meal type (breakfast, lunch, dinner)
        #[arg(value_name = "TYPE")]
        meal_type: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Food ID from the catalog
        #[arg(long)]
        food: Option<String>,

        /// Set ID
        #[arg(long)]
        set: Option<String>,

        /// Amount (grams for a food, servings for a set)
        #[arg(long, short)]
        amount: f64,
    },

    /// List the resolved entries of a meal
    List {
        /// Meal type (breakfast, lunch, dinner)
        #[arg(value_name = "TYPE")]
        meal_type: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Keep printing the meal whenever it or one of its sets changes
        #[arg(long, short)]
        watch: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove an entry from a meal
    Delete {
        /// Meal type (breakfast, lunch, dinner)
        #[arg(value_name = "TYPE")]
        meal_type: String,

        /// Meal entry ID
        meal_id: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },
}

/// Aggregator configured with the merge mode from `config`.
pub fn aggregator(ctx: &DiaryContext, config: &Config) -> MealAggregator {
    let mode = if config.legacy_union_merge.value {
        MergeMode::LegacyUnion
    } else {
        MergeMode::OwnFood
    };
    MealAggregator::new(ctx.store.clone()).with_mode(mode)
}

impl MealCommand {
    pub async fn run(
        &self,
        ctx: &DiaryContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let user_id = &config.user_id.value;

        match &self.command {
            MealSubcommand::Add {
                meal_type,
                date,
                food,
                set,
                amount,
            } => {
                let date = parse_date(date)?;
                let meal_type: MealType = meal_type.parse().map_err(|e: String| e)?;
                let source = match (food, set) {
                    (Some(food_id), _) => {
                        MealSource::Food(FoodService::new(ctx.clone()).require(food_id).await?)
                    }
                    (None, Some(set_id)) => MealSource::Set(set_id.clone()),
                    (None, None) => return Err("Either --food or --set is required".into()),
                };

                let entry = DailyInfoService::new(ctx.clone())
                    .add_meal(user_id, date, meal_type, source, *amount)
                    .await?;
                println!("Meal entry ID: {}", entry.meal_id);
                Ok(())
            }
            MealSubcommand::List {
                meal_type,
                date,
                watch,
                format,
            } => {
                let date = parse_date(date)?;
                let meal_type: MealType = meal_type.parse().map_err(|e: String| e)?;
                let aggregator = aggregator(ctx, config);

                if !*watch {
                    let meals = aggregator.resolve(user_id, date, meal_type).await?;
                    return print_meals(&meals, format);
                }

                let mut subscription = aggregator.subscribe(user_id, date, meal_type)?;
                loop {
                    tokio::select! {
                        update = subscription.next() => match update {
                            Some(meals) => {
                                print_meals(&meals?, format)?;
                                println!();
                            }
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                subscription.dispose();
                Ok(())
            }
            MealSubcommand::Delete {
                meal_type,
                meal_id,
                date,
            } => {
                let date = parse_date(date)?;
                let meal_type: MealType = meal_type.parse().map_err(|e: String| e)?;
                DailyInfoService::new(ctx.clone())
                    .delete_meal(user_id, date, meal_type, meal_id)
                    .await?;
                println!("Deleted meal entry {}", meal_id);
                Ok(())
            }
        }
    }
}

fn print_meals(
    meals: &[ResolvedMeal],
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(meals)?);
        }
        OutputFormat::Text => {
            if meals.is_empty() {
                println!("No entries.");
            }
            for meal in meals {
                print_meal(meal);
            }
        }
    }
    Ok(())
}

pub fn print_meal(meal: &ResolvedMeal) {
    let label = meal.kind().as_str();
    match &meal.value {
        MealValue::Food(food) => {
            let calories = food.nutrition.for_amount(meal.amount).calories;
            println!(
                "  [{}] {} g {} ({:.0} kcal)  {}",
                label, meal.amount, food.name, calories, meal.meal_id
            );
        }
        MealValue::Foods(foods) => {
            let names: Vec<&str> = foods.iter().map(|f| f.name.as_str()).collect();
            println!(
                "  [{}] {} g {}  {}",
                label,
                meal.amount,
                names.join(", "),
                meal.meal_id
            );
        }
        MealValue::Set(Some(set)) => {
            let calories = set.nutrition().calories * meal.amount;
            println!(
                "  [{}] {} x {} ({:.0} kcal)  {}",
                label, meal.amount, set.name, calories, meal.meal_id
            );
        }
        MealValue::Set(None) => {
            println!("  [{}] (deleted set)  {}", label, meal.meal_id);
        }
    }
}
