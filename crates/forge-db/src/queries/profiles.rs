//! Database query functions for the `profiles` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Goal, PlanType, Profile};

/// Column values for inserting or replacing a profile row.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal: Goal,
    pub plan_type: PlanType,
    pub days_per_week: i32,
    pub squat_1rm: f64,
    pub bench_1rm: f64,
    pub deadlift_1rm: f64,
    pub ohp_1rm: f64,
    pub calorie_target: i32,
    pub protein_target_g: i32,
    pub carbs_target_g: i32,
    pub fat_target_g: i32,
}

/// Insert a profile, or overwrite every column of the existing one.
pub async fn upsert_profile(pool: &PgPool, new: &NewProfile) -> Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (user_id, height_cm, weight_kg, goal, plan_type, days_per_week, \
         squat_1rm, bench_1rm, deadlift_1rm, ohp_1rm, \
         calorie_target, protein_target_g, carbs_target_g, fat_target_g) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (user_id) DO UPDATE SET \
             height_cm = EXCLUDED.height_cm, \
             weight_kg = EXCLUDED.weight_kg, \
             goal = EXCLUDED.goal, \
             plan_type = EXCLUDED.plan_type, \
             days_per_week = EXCLUDED.days_per_week, \
             squat_1rm = EXCLUDED.squat_1rm, \
             bench_1rm = EXCLUDED.bench_1rm, \
             deadlift_1rm = EXCLUDED.deadlift_1rm, \
             ohp_1rm = EXCLUDED.ohp_1rm, \
             calorie_target = EXCLUDED.calorie_target, \
             protein_target_g = EXCLUDED.protein_target_g, \
             carbs_target_g = EXCLUDED.carbs_target_g, \
             fat_target_g = EXCLUDED.fat_target_g, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.height_cm)
    .bind(new.weight_kg)
    .bind(new.goal)
    .bind(new.plan_type)
    .bind(new.days_per_week)
    .bind(new.squat_1rm)
    .bind(new.bench_1rm)
    .bind(new.deadlift_1rm)
    .bind(new.ohp_1rm)
    .bind(new.calorie_target)
    .bind(new.protein_target_g)
    .bind(new.carbs_target_g)
    .bind(new.fat_target_g)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert profile for user {}", new.user_id))?;

    Ok(profile)
}

/// Fetch a user's profile.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile")?;

    Ok(profile)
}
