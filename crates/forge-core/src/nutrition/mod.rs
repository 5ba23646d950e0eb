//! Food and water logging.

pub mod lookup;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use forge_db::models::{FoodLog, WaterLog};
use forge_db::queries::food_logs::{self, NewFoodLog};
use forge_db::queries::{profiles, water_logs};

pub use lookup::{FoodItem, FoodLookup, OpenFoodFactsClient};

use crate::profile::MacroTargets;

/// Longest stored food name; longer names are cut.
pub const MAX_FOOD_NAME_LEN: usize = 200;

/// Largest single water entry accepted.
pub const MAX_WATER_ML: i32 = 5000;

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FoodLogError {
    #[error("food name must not be empty")]
    EmptyName,

    #[error("{field} must be {rule}, got {value}")]
    InvalidNumber {
        field: &'static str,
        rule: &'static str,
        value: f64,
    },

    #[error("food entry {0} not found")]
    NotFound(Uuid),

    #[error("food entry {0} belongs to another user")]
    Forbidden(Uuid),

    #[error("water amount must be between 1 and {max} ml, got {0}", max = MAX_WATER_ML)]
    InvalidWaterAmount(i32),
}

/// A food entry as submitted: per-100 g values plus the serving eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntryInput {
    pub food_name: String,
    pub serving_g: f64,
    pub cal_100g: f64,
    pub protein_100g: f64,
    pub carbs_100g: f64,
    pub fat_100g: f64,
}

impl FoodEntryInput {
    fn validate(&self) -> Result<(), FoodLogError> {
        if self.food_name.trim().is_empty() {
            return Err(FoodLogError::EmptyName);
        }
        if !self.serving_g.is_finite() || self.serving_g <= 0.0 {
            return Err(FoodLogError::InvalidNumber {
                field: "serving_g",
                rule: "a positive number",
                value: self.serving_g,
            });
        }
        for (field, value) in [
            ("cal_100g", self.cal_100g),
            ("protein_100g", self.protein_100g),
            ("carbs_100g", self.carbs_100g),
            ("fat_100g", self.fat_100g),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FoodLogError::InvalidNumber {
                    field,
                    rule: "a number >= 0",
                    value,
                });
            }
        }
        Ok(())
    }

    fn item(&self) -> FoodItem {
        FoodItem {
            name: self.food_name.clone(),
            cal_100g: self.cal_100g,
            protein_100g: self.protein_100g,
            carbs_100g: self.carbs_100g,
            fat_100g: self.fat_100g,
        }
    }
}

/// Absolute macros for one serving.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ServingMacros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl ServingMacros {
    /// Scale per-100 g values to `serving_g`, rounding each to 1 decimal.
    pub fn scale(item: &FoodItem, serving_g: f64) -> Self {
        let factor = serving_g / 100.0;
        Self {
            calories: round1(item.cal_100g * factor),
            protein_g: round1(item.protein_100g * factor),
            carbs_g: round1(item.carbs_100g * factor),
            fat_g: round1(item.fat_100g * factor),
        }
    }

    /// Sum of the entries' macros, each total rounded to 1 decimal.
    pub fn total(entries: &[FoodLog]) -> Self {
        let sum = entries.iter().fold(Self::default(), |acc, e| Self {
            calories: acc.calories + e.calories,
            protein_g: acc.protein_g + e.protein_g,
            carbs_g: acc.carbs_g + e.carbs_g,
            fat_g: acc.fat_g + e.fat_g,
        });
        Self {
            calories: round1(sum.calories),
            protein_g: round1(sum.protein_g),
            carbs_g: round1(sum.carbs_g),
            fat_g: round1(sum.fat_g),
        }
    }
}

/// One day of intake against the user's targets.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: Vec<FoodLog>,
    pub totals: ServingMacros,
    pub targets: Option<MacroTargets>,
    pub water_ml: i64,
}

/// Validate, scale, and store a food entry.
pub async fn add_food_entry(pool: &PgPool, user_id: Uuid, input: &FoodEntryInput) -> Result<FoodLog> {
    input.validate()?;

    let macros = ServingMacros::scale(&input.item(), input.serving_g);
    let name: String = input.food_name.trim().chars().take(MAX_FOOD_NAME_LEN).collect();

    let entry = food_logs::insert_food_log(
        pool,
        &NewFoodLog {
            user_id,
            food_name: &name,
            serving_g: input.serving_g,
            calories: macros.calories,
            protein_g: macros.protein_g,
            carbs_g: macros.carbs_g,
            fat_g: macros.fat_g,
        },
    )
    .await?;

    info!(user_id = %user_id, food = %entry.food_name, calories = entry.calories, "food logged");
    Ok(entry)
}

/// Delete one of the user's food entries.
pub async fn delete_food_entry(pool: &PgPool, user_id: Uuid, entry_id: Uuid) -> Result<()> {
    let entry = food_logs::get_food_log(pool, entry_id)
        .await?
        .ok_or(FoodLogError::NotFound(entry_id))?;
    if entry.user_id != user_id {
        return Err(FoodLogError::Forbidden(entry_id).into());
    }
    food_logs::delete_food_log(pool, entry_id).await?;
    info!(user_id = %user_id, entry_id = %entry_id, "food entry deleted");
    Ok(())
}

/// Entries, totals, targets, and water for one UTC day.
pub async fn day_summary(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<DaySummary> {
    let entries = food_logs::list_food_logs_for_day(pool, user_id, date).await?;
    let totals = ServingMacros::total(&entries);
    let targets = profiles::get_profile(pool, user_id).await?.map(|p| MacroTargets {
        calories: p.calorie_target,
        protein_g: p.protein_target_g,
        carbs_g: p.carbs_target_g,
        fat_g: p.fat_target_g,
    });
    let water_ml = water_logs::total_water_for_day(pool, user_id, date).await?;

    Ok(DaySummary {
        date,
        entries,
        totals,
        targets,
        water_ml,
    })
}

pub async fn add_water(pool: &PgPool, user_id: Uuid, amount_ml: i32) -> Result<WaterLog> {
    if !(1..=MAX_WATER_ML).contains(&amount_ml) {
        return Err(FoodLogError::InvalidWaterAmount(amount_ml).into());
    }
    let entry = water_logs::insert_water_log(pool, user_id, amount_ml).await?;
    info!(user_id = %user_id, amount_ml, "water logged");
    Ok(entry)
}

pub async fn water_total(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<i64> {
    water_logs::total_water_for_day(pool, user_id, date).await
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn input() -> FoodEntryInput {
        FoodEntryInput {
            food_name: "Chicken Breast".into(),
            serving_g: 150.0,
            cal_100g: 165.0,
            protein_100g: 31.0,
            carbs_100g: 0.0,
            fat_100g: 3.6,
        }
    }

    #[test]
    fn scale_rounds_to_one_decimal() {
        let m = ServingMacros::scale(&input().item(), 150.0);
        assert_eq!(
            m,
            ServingMacros {
                calories: 247.5,
                protein_g: 46.5,
                carbs_g: 0.0,
                fat_g: 5.4
            }
        );
        let small = ServingMacros::scale(&input().item(), 40.0);
        assert_eq!(small.calories, 66.0);
        assert_eq!(small.fat_g, 1.4);
    }

    #[test]
    fn totals_sum_and_round() {
        let mk = |cal: f64, p: f64| FoodLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            food_name: "x".into(),
            serving_g: 100.0,
            calories: cal,
            protein_g: p,
            carbs_g: 0.1,
            fat_g: 0.0,
            logged_at: Utc::now(),
        };
        let t = ServingMacros::total(&[mk(100.1, 10.2), mk(200.2, 0.1), mk(0.0, 0.0)]);
        assert_eq!(t.calories, 300.3);
        assert_eq!(t.protein_g, 10.3);
        assert_eq!(t.carbs_g, 0.3);
        assert_eq!(ServingMacros::total(&[]), ServingMacros::default());
    }

    #[test]
    fn validation_rejects_bad_numbers() {
        let mut bad = input();
        bad.serving_g = 0.0;
        assert!(matches!(
            bad.validate(),
            Err(FoodLogError::InvalidNumber { field: "serving_g", .. })
        ));

        let mut bad = input();
        bad.fat_100g = f64::NAN;
        assert!(matches!(
            bad.validate(),
            Err(FoodLogError::InvalidNumber { field: "fat_100g", .. })
        ));

        let mut bad = input();
        bad.food_name = "  ".into();
        assert_eq!(bad.validate(), Err(FoodLogError::EmptyName));
    }

    #[test]
    fn round1_behaves() {
        assert_eq!(round1(16.89), 16.9);
        assert_eq!(round1(0.04), 0.0);
        assert_eq!(round1(2.25), 2.3);
    }
}
