use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use mealdiary_core::{DiaryContext, Recipe, RecipeDraft, RecipeService};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Create a recipe from a YAML file
    Import {
        /// Path to the recipe file
        file: PathBuf,
    },

    /// Replace a recipe's content with a YAML file
    Update {
        /// Recipe ID
        recipe_id: String,

        /// Path to the recipe file
        file: PathBuf,
    },

    /// Show a recipe
    Show {
        /// Recipe ID
        recipe_id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List your recipes
    List {
        /// List public recipes from every author instead
        #[arg(long)]
        public: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete one of your recipes
    Delete {
        /// Recipe ID
        recipe_id: String,
    },
}

impl RecipeCommand {
    pub async fn run(
        &self,
        ctx: &DiaryContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = RecipeService::new(ctx.clone());
        let user_id = &config.user_id.value;

        match &self.command {
            RecipeSubcommand::Import { file } => {
                let draft = read_draft(file)?;
                let recipe = service.create(user_id, draft).await?;
                println!("Recipe ID: {}", recipe.recipe_id);
                Ok(())
            }
            RecipeSubcommand::Update { recipe_id, file } => {
                let draft = read_draft(file)?;
                service.update(user_id, recipe_id, draft).await?;
                Ok(())
            }
            RecipeSubcommand::Show { recipe_id, format } => {
                let recipe = service
                    .get(recipe_id)
                    .await?
                    .ok_or_else(|| format!("Recipe not found: {}", recipe_id))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recipe)?),
                    OutputFormat::Text => print!("{}", recipe),
                }
                Ok(())
            }
            RecipeSubcommand::List { public, format } => {
                let recipes = if *public {
                    service.list_public().await?
                } else {
                    service.list_by_author(user_id).await?
                };
                print_recipes(&recipes, format)
            }
            RecipeSubcommand::Delete { recipe_id } => {
                service.delete(user_id, recipe_id).await?;
                println!("Deleted recipe {}", recipe_id);
                Ok(())
            }
        }
    }
}

fn read_draft(path: &Path) -> Result<RecipeDraft, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let draft: RecipeDraft = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    Ok(draft)
}

fn print_recipes(
    recipes: &[Recipe],
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(recipes)?);
        }
        OutputFormat::Text => {
            if recipes.is_empty() {
                println!("No recipes found.");
                return Ok(());
            }
            println!("{:<32} {:<8} {:>8}  ID", "TITLE", "PUBLIC", "KCAL");
            println!("{}", "-".repeat(80));
            for recipe in recipes {
                println!(
                    "{:<32} {:<8} {:>8.0}  {}",
                    recipe.content.title,
                    if recipe.content.public { "yes" } else { "no" },
                    recipe.content.nutrition.calories,
                    recipe.recipe_id
                );
            }
        }
    }
    Ok(())
}
