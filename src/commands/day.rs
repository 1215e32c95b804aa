use clap::{Args, Subcommand};
use serde_json::json;

use mealdiary_core::{
    AverageService, Averages, BodyUpdate, DailyInfoService, DiaryContext, MealType, ResolvedMeal,
};

use super::meal::{aggregator, print_meal};
use super::{parse_date, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct DayCommand {
    #[command(subcommand)]
    pub command: DaySubcommand,
}

#[derive(Subcommand)]
pub enum DaySubcommand {
    /// Start a diary day (no-op if it already exists)
    Create {
        /// Date (YYYY-MM-DD), defaults to today
        date: Option<String>,
    },

    /// Show a day with its body record and meals
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the most recent days
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record weight, body fat and memo for a day
    Body {
        /// Date (YYYY-MM-DD), defaults to today
        date: Option<String>,

        /// Weight in kg (defaults to the last recorded weight)
        #[arg(long, short)]
        weight: Option<f64>,

        /// Body fat in percent (defaults to the last recorded value)
        #[arg(long)]
        fat: Option<f64>,

        /// Free-text memo
        #[arg(long, short)]
        memo: Option<String>,
    },
}

impl DayCommand {
    pub async fn run(
        &self,
        ctx: &DiaryContext,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = DailyInfoService::new(ctx.clone());
        let averages = AverageService::new(ctx.clone());
        let user_id = &config.user_id.value;

        match &self.command {
            DaySubcommand::Create { date } => {
                let date = parse_date(date)?;
                if service.create(user_id, date).await? {
                    println!("Created diary day {}", date);
                } else {
                    println!("Diary day {} already exists", date);
                }
                Ok(())
            }
            DaySubcommand::Show { date, format } => {
                let date = parse_date(date)?;
                let info = service
                    .get(user_id, date)
                    .await?
                    .ok_or_else(|| format!("No diary entry for {}", date))?;
                let aggregator = aggregator(ctx, config);
                let mut meals: Vec<(MealType, Vec<ResolvedMeal>)> = Vec::new();
                for meal_type in MealType::ALL {
                    meals.push((meal_type, aggregator.resolve(user_id, date, meal_type).await?));
                }
                let total = averages.day_total(user_id, date).await?;
                let window = averages.averages(user_id, date).await?;

                match format {
                    OutputFormat::Json => {
                        let mut by_type = serde_json::Map::new();
                        for (meal_type, entries) in &meals {
                            by_type.insert(meal_type.to_string(), serde_json::to_value(entries)?);
                        }
                        let output = json!({
                            "dailyInfo": info,
                            "meals": by_type,
                            "total": total,
                            "averages": window,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", info);
                        for (meal_type, entries) in &meals {
                            print_meals(*meal_type, entries);
                        }
                        println!("\nTotal: {:.0} kcal", total.calories);
                        println!("{}", format_averages(&window));
                    }
                }
                Ok(())
            }
            DaySubcommand::List { format } => {
                let days = service.recent(user_id).await?;
                if days.is_empty() {
                    println!("No diary days found.");
                    return Ok(());
                }
                let window = averages.averages(user_id, days[0].date).await?;
                match format {
                    OutputFormat::Json => {
                        let output = json!({ "days": days, "averages": window });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<12} {:>8} {:>8}  MEMO", "DATE", "WEIGHT", "FAT");
                        println!("{}", "-".repeat(40));
                        for day in &days {
                            println!(
                                "{:<12} {:>8} {:>8}  {}",
                                day.date,
                                format_opt(day.current_weight),
                                format_opt(day.current_fat),
                                day.daily_memo.as_deref().unwrap_or("")
                            );
                        }
                        println!("\n{}", format_averages(&window));
                    }
                }
                Ok(())
            }
            DaySubcommand::Body {
                date,
                weight,
                fat,
                memo,
            } => {
                let date = parse_date(date)?;
                let (weight, fat) = match (weight, fat) {
                    (Some(w), Some(f)) => (*w, *f),
                    _ => {
                        let previous = service.previous_body(user_id, date).await?;
                        let previous_weight = previous.as_ref().and_then(|p| p.current_weight);
                        let previous_fat = previous.as_ref().and_then(|p| p.current_fat);
                        (
                            weight
                                .or(previous_weight)
                                .ok_or("--weight is required (no earlier weight recorded)")?,
                            fat.or(previous_fat)
                                .ok_or("--fat is required (no earlier body fat recorded)")?,
                        )
                    }
                };

                let body = BodyUpdate {
                    author_id: user_id.clone(),
                    date,
                    current_weight: weight,
                    current_fat: fat,
                    daily_memo: memo.clone(),
                };
                service.update_body(&body).await?;
                println!("  Weight: {} kg", weight);
                println!("  Body fat: {} %", fat);
                println!("{}", format_averages(&averages.averages(user_id, date).await?));
                Ok(())
            }
        }
    }
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_averages(averages: &Averages) -> String {
    let from = averages.from.map(|d| d.to_string()).unwrap_or_default();
    let to = averages.to.map(|d| d.to_string()).unwrap_or_default();
    format!(
        "Average {}..{} ({} days): {} kcal, weight {} kg, body fat {} %",
        from,
        to,
        averages.days,
        averages
            .total_calories
            .map(|c| format!("{:.0}", c))
            .unwrap_or_else(|| "-".to_string()),
        format_avg(averages.weight),
        format_avg(averages.fat),
    )
}

fn format_avg(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_meals(meal_type: MealType, entries: &[ResolvedMeal]) {
    println!("\n{}", meal_type);
    println!("{}", "-".repeat(meal_type.as_str().len()));
    if entries.is_empty() {
        println!("  (nothing logged)");
    }
    for entry in entries {
        print_meal(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_averages() {
        let averages = Averages {
            from: NaiveDate::from_ymd_opt(2025, 3, 3),
            to: NaiveDate::from_ymd_opt(2025, 3, 9),
            days: 3,
            total_calories: Some(1833.4),
            weight: Some(61.24),
            fat: None,
        };
        assert_eq!(
            format_averages(&averages),
            "Average 2025-03-03..2025-03-09 (3 days): 1833 kcal, weight 61.2 kg, body fat - %"
        );
    }
}
