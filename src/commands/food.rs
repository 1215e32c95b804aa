use clap::{Args, Subcommand};

use mealdiary_core::{DiaryContext, FoodService, Nutrition};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Add a food to the shared catalog (values per 100 g)
    Create {
        /// Food name
        name: String,

        #[arg(long, default_value_t = 0.0)]
        calories: f64,

        #[arg(long, default_value_t = 0.0)]
        protein: f64,

        #[arg(long, default_value_t = 0.0)]
        fat: f64,

        #[arg(long, default_value_t = 0.0)]
        carbs: f64,

        #[arg(long, default_value_t = 0.0)]
        fiber: f64,

        #[arg(long, default_value_t = 0.0)]
        sugar: f64,

        /// Thumbnail image URL
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Show a food
    Show {
        /// Food ID
        food_id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark a food as favorite
    Like {
        /// Food ID
        food_id: String,
    },

    /// Remove a food from favorites
    Unlike {
        /// Food ID
        food_id: String,
    },

    /// List favorite foods
    Favorites {
        /// Load every page instead of only the first
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl FoodCommand {
    pub async fn run(
        &self,
        ctx: &DiaryContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = FoodService::new(ctx.clone());
        let user_id = &config.user_id.value;

        match &self.command {
            FoodSubcommand::Create {
                name,
                calories,
                protein,
                fat,
                carbs,
                fiber,
                sugar,
                thumbnail,
            } => {
                let nutrition = Nutrition {
                    calories: *calories,
                    protein: *protein,
                    fat: *fat,
                    total_carbohydrate: *carbs,
                    dietary_fiber: *fiber,
                    sugar: *sugar,
                };
                let mut food = service.create(name, nutrition).await?;
                if let Some(url) = thumbnail {
                    food = food.with_thumbnail_url(url);
                    service.put(&food).await?;
                }
                println!("Created food:");
                println!();
                print!("{}", food);
                println!();
                println!("Food ID: {}", food.food_id);
                Ok(())
            }
            FoodSubcommand::Show { food_id, format } => {
                let food = service.require(food_id).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&food)?),
                    OutputFormat::Text => print!("{}", food),
                }
                Ok(())
            }
            FoodSubcommand::Like { food_id } => {
                service.favorites().load(user_id).await?;
                if service.favorites().is_liked(food_id) {
                    println!("Already a favorite: {}", food_id);
                    return Ok(());
                }
                service.favorites().like(user_id, food_id).await?;
                println!("Added to favorites: {}", food_id);
                Ok(())
            }
            FoodSubcommand::Unlike { food_id } => {
                service.favorites().unlike(user_id, food_id).await?;
                println!("Removed from favorites: {}", food_id);
                Ok(())
            }
            FoodSubcommand::Favorites { all, format } => {
                let page_size = config.page_size.value;
                let mut pager = service.favorites_pager(user_id)?;
                pager.load_next(ctx.store.as_ref(), page_size).await?;
                while *all && pager.has_next() {
                    pager.load_next(ctx.store.as_ref(), page_size).await?;
                }

                match format {
                    OutputFormat::Json => {
                        let favorites: Vec<_> = pager.items().collect();
                        println!("{}", serde_json::to_string_pretty(&favorites)?);
                    }
                    OutputFormat::Text => {
                        if pager.is_empty() {
                            println!("No favorite foods.");
                            return Ok(());
                        }
                        println!("{:<24} {:>10}  ID", "NAME", "KCAL/100G");
                        println!("{}", "-".repeat(60));
                        for fav in pager.items() {
                            println!(
                                "{:<24} {:>10.0}  {}",
                                fav.food.name, fav.food.nutrition.calories, fav.food.food_id
                            );
                        }
                        if pager.has_next() {
                            println!("\nMore favorites available; use --all to list them.");
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
