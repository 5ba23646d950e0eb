//! Database query functions for the `food_logs` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::FoodLog;

/// Column values for a food entry. Macros are absolute (already scaled to
/// the serving).
#[derive(Debug, Clone)]
pub struct NewFoodLog<'a> {
    pub user_id: Uuid,
    pub food_name: &'a str,
    pub serving_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Insert a food entry.
pub async fn insert_food_log(pool: &PgPool, new: &NewFoodLog<'_>) -> Result<FoodLog> {
    let entry = sqlx::query_as::<_, FoodLog>(
        "INSERT INTO food_logs (user_id, food_name, serving_g, calories, protein_g, carbs_g, fat_g) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.food_name)
    .bind(new.serving_g)
    .bind(new.calories)
    .bind(new.protein_g)
    .bind(new.carbs_g)
    .bind(new.fat_g)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert food log {:?}", new.food_name))?;

    Ok(entry)
}

/// Fetch a food entry by ID.
pub async fn get_food_log(pool: &PgPool, id: Uuid) -> Result<Option<FoodLog>> {
    let entry = sqlx::query_as::<_, FoodLog>("SELECT * FROM food_logs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch food log")?;

    Ok(entry)
}

/// Delete a food entry by ID.
pub async fn delete_food_log(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM food_logs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete food log")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("food log {id} not found");
    }

    Ok(())
}

/// List a user's entries for one UTC calendar day, oldest first.
pub async fn list_food_logs_for_day(
    pool: &PgPool,
    user_id: Uuid,
    day: NaiveDate,
) -> Result<Vec<FoodLog>> {
    let entries = sqlx::query_as::<_, FoodLog>(
        "SELECT * FROM food_logs \
         WHERE user_id = $1 AND (logged_at AT TIME ZONE 'UTC')::date = $2 \
         ORDER BY logged_at",
    )
    .bind(user_id)
    .bind(day)
    .fetch_all(pool)
    .await
    .context("failed to list food logs")?;

    Ok(entries)
}
