//! Database query functions for the `water_logs` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WaterLog;

/// Insert a water intake entry.
pub async fn insert_water_log(pool: &PgPool, user_id: Uuid, amount_ml: i32) -> Result<WaterLog> {
    let entry = sqlx::query_as::<_, WaterLog>(
        "INSERT INTO water_logs (user_id, amount_ml) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(amount_ml)
    .fetch_one(pool)
    .await
    .context("failed to insert water log")?;

    Ok(entry)
}

/// Total millilitres a user logged on one UTC calendar day.
pub async fn total_water_for_day(pool: &PgPool, user_id: Uuid, day: NaiveDate) -> Result<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_ml), 0)::bigint FROM water_logs \
         WHERE user_id = $1 AND (logged_at AT TIME ZONE 'UTC')::date = $2",
    )
    .bind(user_id)
    .bind(day)
    .fetch_one(pool)
    .await
    .context("failed to total water logs")?;

    Ok(total)
}
