use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;

use commands::{
    ConfigCommand, ConsoleNotifier, DayCommand, FoodCommand, MealCommand, RecipeCommand,
    SetCommand,
};
use config::Config;
use db::{init_db, SqliteStore};
use mealdiary_core::{DiaryContext, SharedStore};

#[derive(Parser)]
#[command(name = "mealdiary")]
#[command(version)]
#[command(about = "A meal and body diary", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage diary days and body records
    Day(DayCommand),

    /// Log, list and remove meal entries
    Meal(MealCommand),

    /// Manage the food catalog and favorites
    Food(FoodCommand),

    /// Manage reusable meal sets
    Set(SetCommand),

    /// Manage recipes
    Recipe(RecipeCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mealdiary=warn,mealdiary_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn open_context(config: &Config) -> Result<DiaryContext, Box<dyn std::error::Error>> {
    let pool = init_db(&config.database_path.value).await?;
    let store: SharedStore = Arc::new(SqliteStore::new(pool));
    Ok(DiaryContext::new(store).with_notifier(Arc::new(ConsoleNotifier)))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.clone())?;

    match cli.command {
        Some(Commands::Day(cmd)) => cmd.run(&open_context(&config).await?, &config).await?,
        Some(Commands::Meal(cmd)) => cmd.run(&open_context(&config).await?, &config).await?,
        Some(Commands::Food(cmd)) => cmd.run(&open_context(&config).await?, &config).await?,
        Some(Commands::Set(cmd)) => cmd.run(&open_context(&config).await?, &config).await?,
        Some(Commands::Recipe(cmd)) => cmd.run(&open_context(&config).await?, &config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli.config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
