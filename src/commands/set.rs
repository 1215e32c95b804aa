use clap::{Args, Subcommand};

use mealdiary_core::{DiaryContext, FoodService, MealSet, MealType, NewMealSet, SetFood, SetService};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct SetCommand {
    #[command(subcommand)]
    pub command: SetSubcommand,
}

#[derive(Subcommand)]
pub enum SetSubcommand {
    /// Create a reusable set of foods
    Create {
        /// Set name
        name: String,

        /// Meal the set applies to (can be repeated)
        #[arg(long = "meal", value_name = "TYPE")]
        meals: Vec<String>,

        /// Food and grams as FOOD_ID:GRAMS (can be repeated)
        #[arg(long = "food", value_name = "FOOD_ID:GRAMS")]
        foods: Vec<String>,
    },

    /// List sets, most recently updated first
    List {
        /// Only sets applicable to this meal
        #[arg(long, value_name = "TYPE")]
        meal: Option<String>,

        /// Load every page instead of only the first
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a set
    Show {
        /// Set ID
        set_id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Turn a meal applicability flag on or off
    Flag {
        /// Set ID
        set_id: String,

        /// Meal type (breakfast, lunch, dinner)
        #[arg(value_name = "TYPE")]
        meal: String,

        /// Clear the flag instead of setting it
        #[arg(long)]
        off: bool,
    },

    /// Delete a set
    Delete {
        /// Set ID
        set_id: String,
    },
}

impl SetCommand {
    pub async fn run(
        &self,
        ctx: &DiaryContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = SetService::new(ctx.clone());
        let user_id = &config.user_id.value;

        match &self.command {
            SetSubcommand::Create { name, meals, foods } => {
                let meals = meals
                    .iter()
                    .map(|m| m.parse::<MealType>())
                    .collect::<Result<Vec<_>, String>>()?;

                let catalog = FoodService::new(ctx.clone());
                let mut set_foods = Vec::new();
                for spec in foods {
                    let (food_id, grams) = parse_food_spec(spec)?;
                    set_foods.push(SetFood::new(catalog.require(food_id).await?, grams));
                }

                let set = service
                    .create(NewMealSet {
                        user_id: user_id.clone(),
                        name: name.clone(),
                        meals,
                        foods: set_foods,
                    })
                    .await?;
                println!();
                print!("{}", set);
                println!();
                println!("Set ID: {}", set.set_id);
                Ok(())
            }
            SetSubcommand::List { meal, all, format } => {
                let meal = meal
                    .as_deref()
                    .map(|m| m.parse::<MealType>())
                    .transpose()?;
                let page_size = config.page_size.value;
                let mut pager = service.pager(user_id, meal)?;
                pager.load_next(ctx.store.as_ref(), page_size).await?;
                while *all && pager.has_next() {
                    pager.load_next(ctx.store.as_ref(), page_size).await?;
                }

                match format {
                    OutputFormat::Json => {
                        let sets: Vec<&MealSet> = pager.items().collect();
                        println!("{}", serde_json::to_string_pretty(&sets)?);
                    }
                    OutputFormat::Text => {
                        if pager.is_empty() {
                            println!("No sets found.");
                            return Ok(());
                        }
                        println!("{:<24} {:<24} {:>8}  ID", "NAME", "MEALS", "KCAL");
                        println!("{}", "-".repeat(80));
                        for set in pager.items() {
                            let meals: Vec<&str> = MealType::ALL
                                .iter()
                                .filter(|m| set.applies_to(**m))
                                .map(|m| m.as_str())
                                .collect();
                            println!(
                                "{:<24} {:<24} {:>8.0}  {}",
                                set.name,
                                meals.join(","),
                                set.nutrition().calories,
                                set.set_id
                            );
                        }
                        if pager.has_next() {
                            println!("\nMore sets available; use --all to list them.");
                        }
                    }
                }
                Ok(())
            }
            SetSubcommand::Show { set_id, format } => {
                let set = service
                    .get(user_id, set_id)
                    .await?
                    .ok_or_else(|| format!("Set not found: {}", set_id))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&set)?),
                    OutputFormat::Text => print!("{}", set),
                }
                Ok(())
            }
            SetSubcommand::Flag { set_id, meal, off } => {
                let meal: MealType = meal.parse().map_err(|e: String| e)?;
                service.set_meal_flag(user_id, set_id, meal, !*off).await?;
                println!(
                    "Set {} {} {}",
                    set_id,
                    if *off { "no longer applies to" } else { "now applies to" },
                    meal
                );
                Ok(())
            }
            SetSubcommand::Delete { set_id } => {
                service.delete(user_id, set_id).await?;
                Ok(())
            }
        }
    }
}

/// Parses `FOOD_ID:GRAMS`.
fn parse_food_spec(spec: &str) -> Result<(&str, f64), String> {
    let (food_id, grams) = spec
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid food '{}'. Use FOOD_ID:GRAMS.", spec))?;
    let grams: f64 = grams
        .parse()
        .map_err(|_| format!("Invalid amount '{}' for food '{}'", grams, food_id))?;
    if food_id.is_empty() {
        return Err(format!("Invalid food '{}'. Use FOOD_ID:GRAMS.", spec));
    }
    Ok((food_id, grams))
}
