use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use super::OutputFormat;
use crate::config::{Config, ConfigSource};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print every setting and where it came from
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a commented config file with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

const CONFIG_TEMPLATE: &str = r#"# mealdiary configuration

# SQLite database. Relative paths are resolved against this file's directory.
# Defaults to mealdiary.db in the platform data directory.
# database_path: mealdiary.db

# Diary owner used by every command
user_id: default

# Items per page for `food favorites` and `set list`
page_size: 10

# Attach all standalone foods of a meal to every food entry (older behavior)
legacy_union_merge: false
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let target = cli_config_path.unwrap_or_else(Config::default_config_path);

        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                    OutputFormat::Text => print!("{}", render_settings(config, &target)),
                }
                Ok(())
            }
            ConfigSubcommand::Init { force } => {
                if target.exists() && !force {
                    println!("Config file already exists: {}", target.display());
                    println!("Run 'mealdiary config init --force' to overwrite it.");
                    return Ok(());
                }
                write_template(&target)?;
                println!("Wrote {}", target.display());
                Ok(())
            }
        }
    }
}

fn render_settings(config: &Config, target: &Path) -> String {
    let rows: [(&str, String, ConfigSource); 4] = [
        (
            "database_path",
            config.database_path.value.display().to_string(),
            config.database_path.source,
        ),
        ("user_id", config.user_id.value.clone(), config.user_id.source),
        (
            "page_size",
            config.page_size.value.to_string(),
            config.page_size.source,
        ),
        (
            "legacy_union_merge",
            config.legacy_union_merge.value.to_string(),
            config.legacy_union_merge.source,
        ),
    ];

    let mut out = match &config.config_file {
        Some(path) => format!("Config file: {}\n\n", path.display()),
        None => format!("Config file: {} (not found)\n\n", target.display()),
    };
    for (key, value, source) in rows {
        out.push_str(&format!("{:<20} {:<40} [{}]\n", key, value, source));
    }
    out
}

fn write_template(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, CONFIG_TEMPLATE)
}
