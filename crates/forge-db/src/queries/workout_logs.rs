//! Database query functions for the `workout_logs` table.
//!
//! At most one live row exists per `(exercise_id, user_id)`; logging again
//! overwrites it.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WorkoutLog;

/// Record the actual reps/weight a user achieved, replacing any earlier
/// entry for the same exercise.
pub async fn upsert_log(
    pool: &PgPool,
    user_id: Uuid,
    exercise_id: Uuid,
    reps: i32,
    weight_kg: f64,
) -> Result<WorkoutLog> {
    let log = sqlx::query_as::<_, WorkoutLog>(
        "INSERT INTO workout_logs (exercise_id, user_id, reps, weight_kg) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (exercise_id, user_id) DO UPDATE SET \
             reps = EXCLUDED.reps, \
             weight_kg = EXCLUDED.weight_kg, \
             logged_at = now() \
         RETURNING *",
    )
    .bind(exercise_id)
    .bind(user_id)
    .bind(reps)
    .bind(weight_kg)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to log performance for exercise {exercise_id}"))?;

    Ok(log)
}

/// List the user's logs for every exercise in a plan.
pub async fn list_logs_for_plan(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Vec<WorkoutLog>> {
    let logs = sqlx::query_as::<_, WorkoutLog>(
        "SELECT l.* FROM workout_logs l \
         JOIN exercises e ON e.id = l.exercise_id \
         JOIN workout_days d ON d.id = e.day_id \
         WHERE d.plan_id = $1 AND l.user_id = $2 \
         ORDER BY d.day_index, e.position",
    )
    .bind(plan_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list workout logs for plan")?;

    Ok(logs)
}
