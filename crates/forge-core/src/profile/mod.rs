//! Profile input validation and derived macro targets.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use forge_db::models::{Goal, PlanType, Profile};
use forge_db::queries::profiles::{self, NewProfile};

/// The profile facts that drive plan generation, independent of storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal: Goal,
    pub plan_type: PlanType,
    pub days_per_week: i32,
    pub squat_1rm: f64,
    pub bench_1rm: f64,
    pub deadlift_1rm: f64,
    pub ohp_1rm: f64,
}

impl From<&Profile> for ProfileSnapshot {
    fn from(p: &Profile) -> Self {
        Self {
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            goal: p.goal,
            plan_type: p.plan_type,
            days_per_week: p.days_per_week,
            squat_1rm: p.squat_1rm,
            bench_1rm: p.bench_1rm,
            deadlift_1rm: p.deadlift_1rm,
            ohp_1rm: p.ohp_1rm,
        }
    }
}

/// Rejected profile input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("days_per_week must be between 1 and 7, got {0}")]
    DaysOutOfRange(i32),
}

impl ProfileSnapshot {
    /// Check body metrics, benchmarks, and training frequency.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let metrics = [
            ("height_cm", self.height_cm),
            ("weight_kg", self.weight_kg),
            ("squat_1rm", self.squat_1rm),
            ("bench_1rm", self.bench_1rm),
            ("deadlift_1rm", self.deadlift_1rm),
            ("ohp_1rm", self.ohp_1rm),
        ];
        for (field, value) in metrics {
            if !value.is_finite() || value <= 0.0 {
                return Err(ProfileError::NotPositive { field, value });
            }
        }
        if !(1..=7).contains(&self.days_per_week) {
            return Err(ProfileError::DaysOutOfRange(self.days_per_week));
        }
        Ok(())
    }
}

/// Daily nutrition targets derived from body weight and goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
}

impl MacroTargets {
    /// Compute targets: calories and protein scale with body weight, fat takes
    /// a fixed share of calories, carbs fill the remainder.
    pub fn for_profile(weight_kg: f64, goal: Goal) -> Self {
        let (kcal_per_kg, protein_per_kg, fat_share) = match goal {
            Goal::Muscle => (35.0, 2.0, 0.25),
            Goal::Strength => (33.0, 1.8, 0.30),
            Goal::General => (30.0, 1.6, 0.30),
        };

        let calories = weight_kg * kcal_per_kg;
        let protein = weight_kg * protein_per_kg;
        let fat = calories * fat_share / 9.0;
        let carbs = ((calories - protein * 4.0 - fat * 9.0) / 4.0).max(0.0);

        Self {
            calories: calories.round() as i32,
            protein_g: protein.round() as i32,
            carbs_g: carbs.round() as i32,
            fat_g: fat.round() as i32,
        }
    }
}

/// Validate the snapshot, recompute macro targets, and upsert the profile row.
pub async fn save_profile(pool: &PgPool, user_id: Uuid, input: &ProfileSnapshot) -> Result<Profile> {
    input.validate()?;
    let targets = MacroTargets::for_profile(input.weight_kg, input.goal);

    let new = NewProfile {
        user_id,
        height_cm: input.height_cm,
        weight_kg: input.weight_kg,
        goal: input.goal,
        plan_type: input.plan_type,
        days_per_week: input.days_per_week,
        squat_1rm: input.squat_1rm,
        bench_1rm: input.bench_1rm,
        deadlift_1rm: input.deadlift_1rm,
        ohp_1rm: input.ohp_1rm,
        calorie_target: targets.calories,
        protein_target_g: targets.protein_g,
        carbs_target_g: targets.carbs_g,
        fat_target_g: targets.fat_g,
    };
    let profile = profiles::upsert_profile(pool, &new).await?;

    info!(
        user_id = %user_id,
        goal = %profile.goal,
        plan_type = %profile.plan_type,
        calories = profile.calorie_target,
        "profile saved"
    );
    Ok(profile)
}
