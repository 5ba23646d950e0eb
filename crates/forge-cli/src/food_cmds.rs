//! `forge food` and `forge water` commands.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use forge_core::nutrition::lookup::is_barcode;
use forge_core::nutrition::{
    self, DaySummary, FoodEntryInput, FoodItem, FoodLookup, add_food_entry, add_water, day_summary,
    delete_food_entry,
};

use crate::{FoodCommands, WaterCommands};

/// Dispatch a `FoodCommands` variant. `user_id` is `None` for the lookup
/// subcommands, which need no account.
pub async fn run_food_command(
    command: FoodCommands,
    pool: &PgPool,
    lookup: &dyn FoodLookup,
    user_id: Option<Uuid>,
) -> Result<()> {
    match command {
        FoodCommands::Search { query } => {
            print_items(&lookup.search(query.trim()).await);
            Ok(())
        }
        FoodCommands::Barcode { code } => {
            let code = code.trim();
            if !is_barcode(code) {
                bail!("invalid barcode {code:?}: expected 8 to 14 digits");
            }
            print_items(&lookup.barcode(code).await);
            Ok(())
        }
        FoodCommands::Add {
            name,
            serving_g,
            cal,
            protein,
            carbs,
            fat,
        } => {
            let user_id = user_id.context("this command needs --user <id-or-email>")?;
            let input = FoodEntryInput {
                food_name: name,
                serving_g,
                cal_100g: cal,
                protein_100g: protein,
                carbs_100g: carbs,
                fat_100g: fat,
            };
            let entry = add_food_entry(pool, user_id, &input).await?;
            println!(
                "Logged {} ({}g): {} kcal, {}g protein, {}g carbs, {}g fat",
                entry.food_name,
                entry.serving_g,
                entry.calories,
                entry.protein_g,
                entry.carbs_g,
                entry.fat_g
            );
            println!("  Entry ID: {}", entry.id);
            Ok(())
        }
        FoodCommands::List { date } => {
            let user_id = user_id.context("this command needs --user <id-or-email>")?;
            let date = date.unwrap_or_else(today);
            let summary = day_summary(pool, user_id, date).await?;
            print_summary(&summary);
            Ok(())
        }
        FoodCommands::Delete { entry_id } => {
            let user_id = user_id.context("this command needs --user <id-or-email>")?;
            let id = Uuid::parse_str(&entry_id)
                .with_context(|| format!("invalid entry ID: {entry_id}"))?;
            delete_food_entry(pool, user_id, id).await?;
            println!("Entry {id} deleted.");
            Ok(())
        }
    }
}

pub async fn run_water_command(command: WaterCommands, pool: &PgPool, user_id: Uuid) -> Result<()> {
    match command {
        WaterCommands::Add { amount_ml } => {
            add_water(pool, user_id, amount_ml).await?;
            let total = nutrition::water_total(pool, user_id, today()).await?;
            println!("Logged {amount_ml} ml. Today: {total} ml.");
        }
        WaterCommands::Today => {
            let total = nutrition::water_total(pool, user_id, today()).await?;
            println!("Today: {total} ml.");
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_items(items: &[FoodItem]) {
    if items.is_empty() {
        println!("No results.");
        return;
    }
    println!("Per 100 g:");
    for item in items {
        println!(
            "  {}: {} kcal, {}g protein, {}g carbs, {}g fat",
            item.name, item.cal_100g, item.protein_100g, item.carbs_100g, item.fat_100g
        );
    }
}

fn print_summary(summary: &DaySummary) {
    println!("{}", summary.date);
    if summary.entries.is_empty() {
        println!("  No food logged.");
    }
    for e in &summary.entries {
        println!(
            "  {}  {} ({}g): {} kcal, P {} / C {} / F {}",
            e.id, e.food_name, e.serving_g, e.calories, e.protein_g, e.carbs_g, e.fat_g
        );
    }

    let t = &summary.totals;
    println!();
    match &summary.targets {
        Some(target) => {
            println!("  Calories: {} / {} kcal", t.calories, target.calories);
            println!("  Protein:  {} / {} g", t.protein_g, target.protein_g);
            println!("  Carbs:    {} / {} g", t.carbs_g, target.carbs_g);
            println!("  Fat:      {} / {} g", t.fat_g, target.fat_g);
        }
        None => {
            println!(
                "  Totals: {} kcal, {}g protein, {}g carbs, {}g fat",
                t.calories, t.protein_g, t.carbs_g, t.fat_g
            );
        }
    }
    println!("  Water:    {} ml", summary.water_ml);
}
