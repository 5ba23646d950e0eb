//! Database query functions for the `workout_plans`, `workout_days`, and
//! `exercises` tables.
//!
//! Row-level inserts take a `&mut PgConnection` so callers can stage a whole
//! plan inside one transaction and commit once at the end.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Exercise, WorkoutDay, WorkoutPlan};

/// A plan with its days and exercises, both in display order.
#[derive(Debug, Clone, Serialize)]
pub struct PlanTree {
    #[serde(flatten)]
    pub plan: WorkoutPlan,
    pub days: Vec<DayTree>,
}

/// A day with its exercises ordered by position.
#[derive(Debug, Clone, Serialize)]
pub struct DayTree {
    #[serde(flatten)]
    pub day: WorkoutDay,
    pub exercises: Vec<Exercise>,
}

/// Column values for one exercise row.
#[derive(Debug, Clone)]
pub struct NewExercise<'a> {
    pub day_id: Uuid,
    pub position: i32,
    pub name: &'a str,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub is_compound: bool,
    pub notes: &'a str,
}

// -----------------------------------------------------------------------
// Staged writes
// -----------------------------------------------------------------------

/// Insert a plan row and return it with its generated id.
pub async fn insert_plan_row(
    conn: &mut PgConnection,
    user_id: Uuid,
    week_number: i32,
) -> Result<WorkoutPlan> {
    let plan = sqlx::query_as::<_, WorkoutPlan>(
        "INSERT INTO workout_plans (user_id, week_number) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(week_number)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to insert week {week_number} plan"))?;

    Ok(plan)
}

/// Insert a day row and return it with its generated id.
pub async fn insert_day_row(
    conn: &mut PgConnection,
    plan_id: Uuid,
    day_index: i32,
    label: &str,
) -> Result<WorkoutDay> {
    let day = sqlx::query_as::<_, WorkoutDay>(
        "INSERT INTO workout_days (plan_id, day_index, label) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(plan_id)
    .bind(day_index)
    .bind(label)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to insert workout day {day_index} ({label:?})"))?;

    Ok(day)
}

/// Insert an exercise row.
pub async fn insert_exercise_row(conn: &mut PgConnection, new: &NewExercise<'_>) -> Result<Exercise> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises (day_id, position, name, sets, reps, weight_kg, is_compound, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(new.day_id)
    .bind(new.position)
    .bind(new.name)
    .bind(new.sets)
    .bind(new.reps)
    .bind(new.weight_kg)
    .bind(new.is_compound)
    .bind(new.notes)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to insert exercise {:?}", new.name))?;

    Ok(exercise)
}

/// Delete every day of a plan. Exercises and their logs go with them via
/// `ON DELETE CASCADE`. Returns the number of days removed.
pub async fn delete_plan_days(conn: &mut PgConnection, plan_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM workout_days WHERE plan_id = $1")
        .bind(plan_id)
        .execute(conn)
        .await
        .context("failed to delete workout days")?;

    Ok(result.rows_affected())
}

// -----------------------------------------------------------------------
// Reads
// -----------------------------------------------------------------------

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<WorkoutPlan>> {
    let plan = sqlx::query_as::<_, WorkoutPlan>("SELECT * FROM workout_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Fetch the user's current plan: highest week number, newest first on ties.
pub async fn get_latest_plan(pool: &PgPool, user_id: Uuid) -> Result<Option<WorkoutPlan>> {
    let plan = sqlx::query_as::<_, WorkoutPlan>(
        "SELECT * FROM workout_plans WHERE user_id = $1 \
         ORDER BY week_number DESC, created_at DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest plan")?;

    Ok(plan)
}

/// List all of a user's plans, newest week first.
pub async fn list_plans_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<WorkoutPlan>> {
    let plans = sqlx::query_as::<_, WorkoutPlan>(
        "SELECT * FROM workout_plans WHERE user_id = $1 \
         ORDER BY week_number DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans")?;

    Ok(plans)
}

/// Fetch a plan with all of its days and exercises.
pub async fn get_plan_tree(pool: &PgPool, plan_id: Uuid) -> Result<Option<PlanTree>> {
    let Some(plan) = get_plan(pool, plan_id).await? else {
        return Ok(None);
    };

    let days = sqlx::query_as::<_, WorkoutDay>(
        "SELECT * FROM workout_days WHERE plan_id = $1 ORDER BY day_index",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list workout days")?;

    let exercises = sqlx::query_as::<_, Exercise>(
        "SELECT e.* FROM exercises e \
         JOIN workout_days d ON d.id = e.day_id \
         WHERE d.plan_id = $1 \
         ORDER BY d.day_index, e.position",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list exercises")?;

    let mut by_day: HashMap<Uuid, Vec<Exercise>> = HashMap::new();
    for exercise in exercises {
        by_day.entry(exercise.day_id).or_default().push(exercise);
    }

    let days = days
        .into_iter()
        .map(|day| {
            let exercises = by_day.remove(&day.id).unwrap_or_default();
            DayTree { day, exercises }
        })
        .collect();

    Ok(Some(PlanTree { plan, days }))
}

/// Whether the exercise belongs to one of the user's plans.
pub async fn exercise_belongs_to_user(
    pool: &PgPool,
    exercise_id: Uuid,
    user_id: Uuid,
) -> Result<bool> {
    let owned: bool = sqlx::query_scalar(
        "SELECT EXISTS( \
             SELECT 1 FROM exercises e \
             JOIN workout_days d ON d.id = e.day_id \
             JOIN workout_plans p ON p.id = d.plan_id \
             WHERE e.id = $1 AND p.user_id = $2 \
         )",
    )
    .bind(exercise_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("failed to check exercise ownership")?;

    Ok(owned)
}
