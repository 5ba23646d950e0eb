//! Plan service layer.
//!
//! Persists generated weeks and runs the onboarding, profile-edit, and
//! next-week flows. Every multi-row write stages all rows inside one
//! transaction and commits once at the end; an error anywhere drops the
//! transaction and rolls everything back.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use forge_db::models::{Profile, WorkoutPlan};
use forge_db::queries::plans::{self as plan_queries, NewExercise, PlanTree};
use forge_db::queries::{exercise_notes, profiles, workout_logs};

use super::context::{DayContext, plan_context};
use super::contract::DayPlan;
use super::generate::generate_plan;
use super::prompt::GenerationRequest;
use crate::llm::TextGenerator;
use crate::profile::{ProfileSnapshot, save_profile};

/// Preconditions a flow needs before it can call the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanServiceError {
    #[error("user {0} has no profile; complete onboarding first")]
    NoProfile(Uuid),

    #[error("user {0} has no plan yet")]
    NoPlan(Uuid),
}

/// Result of onboarding or a profile edit.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileAndPlan {
    pub profile: Profile,
    pub plan: WorkoutPlan,
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Insert a new plan row for `week_number` with all of its days and
/// exercises, atomically.
pub async fn save_plan(
    pool: &PgPool,
    user_id: Uuid,
    week_number: i32,
    days: &[DayPlan],
) -> Result<WorkoutPlan> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let plan = plan_queries::insert_plan_row(&mut *tx, user_id, week_number).await?;
    stage_days(&mut *tx, plan.id, days).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        user_id = %user_id,
        plan_id = %plan.id,
        week = week_number,
        days = days.len(),
        "plan saved"
    );
    Ok(plan)
}

/// Swap out every day of an existing plan for `days`, atomically. The plan
/// row (id, week number, creation time) is untouched. Logs attached to the
/// old exercises are removed with them.
pub async fn replace_plan_days(pool: &PgPool, plan_id: Uuid, days: &[DayPlan]) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let removed = plan_queries::delete_plan_days(&mut *tx, plan_id).await?;
    stage_days(&mut *tx, plan_id, days).await?;

    // Nothing above is visible to other connections until this commit.
    tx.commit().await.context("failed to commit transaction")?;

    info!(
        plan_id = %plan_id,
        removed_days = removed,
        new_days = days.len(),
        "plan days replaced"
    );
    Ok(())
}

async fn stage_days(conn: &mut PgConnection, plan_id: Uuid, days: &[DayPlan]) -> Result<()> {
    for day in days {
        let row = plan_queries::insert_day_row(conn, plan_id, day.day_index, &day.label).await?;

        for (position, ex) in (0..).zip(&day.exercises) {
            plan_queries::insert_exercise_row(
                conn,
                &NewExercise {
                    day_id: row.id,
                    position,
                    name: &ex.name,
                    sets: ex.sets,
                    reps: ex.reps,
                    weight_kg: ex.weight_kg,
                    is_compound: ex.is_compound,
                    notes: &ex.notes,
                },
            )
            .await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// The user's latest plan (highest week, newest on ties) with its contents.
pub async fn current_plan(pool: &PgPool, user_id: Uuid) -> Result<Option<PlanTree>> {
    let Some(plan) = plan_queries::get_latest_plan(pool, user_id).await? else {
        return Ok(None);
    };
    plan_queries::get_plan_tree(pool, plan.id).await
}

/// The latest plan together with its log-enriched contract view.
pub async fn current_context(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<(PlanTree, Vec<DayContext>)>> {
    let Some(tree) = current_plan(pool, user_id).await? else {
        return Ok(None);
    };
    let logs = workout_logs::list_logs_for_plan(pool, user_id, tree.plan.id).await?;
    let days = plan_context(&tree, &logs);
    Ok(Some((tree, days)))
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Save the profile and generate week 1 from it.
///
/// The profile is committed before the model is called, so a failed
/// generation leaves the profile in place and no plan rows behind.
pub async fn onboard(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
    input: &ProfileSnapshot,
) -> Result<ProfileAndPlan> {
    let profile = save_profile(pool, user_id, input).await?;
    let plan = generate_first_week(pool, generator, &profile).await?;
    Ok(ProfileAndPlan { profile, plan })
}

/// Profile edit: save the new values and generate a fresh week 1. Earlier
/// plans are kept. The new plan is only current if no later week exists,
/// since the current plan is chosen by week number first.
pub async fn regenerate_from_profile(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
    input: &ProfileSnapshot,
) -> Result<ProfileAndPlan> {
    let profile = save_profile(pool, user_id, input).await?;
    info!(user_id = %user_id, "profile changed, regenerating week 1");
    let plan = generate_first_week(pool, generator, &profile).await?;
    Ok(ProfileAndPlan { profile, plan })
}

/// Generate and save week 1 for an existing profile.
pub async fn generate_first_week(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    profile: &Profile,
) -> Result<WorkoutPlan> {
    let snapshot = ProfileSnapshot::from(profile);
    let notes = exercise_notes::list_notes(pool, profile.user_id).await?;
    let req = GenerationRequest {
        notes: &notes,
        ..GenerationRequest::first_week(&snapshot)
    };

    let days = generate_plan(generator, &req).await?;
    save_plan(pool, profile.user_id, 1, &days).await
}

/// Generate week N+1 from the latest plan, its logged actuals, and notes.
/// A user with a profile but no plan yet gets week 1.
pub async fn generate_next_week(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
) -> Result<WorkoutPlan> {
    let profile = profiles::get_profile(pool, user_id)
        .await?
        .ok_or(PlanServiceError::NoProfile(user_id))?;
    let current = current_context(pool, user_id).await?;
    let notes = exercise_notes::list_notes(pool, user_id).await?;

    let snapshot = ProfileSnapshot::from(&profile);
    let from_week = current.as_ref().map_or(0, |(tree, _)| tree.plan.week_number);
    let week_number = from_week + 1;
    let req = GenerationRequest {
        profile: &snapshot,
        week_number,
        previous: current.as_ref().map(|(_, days)| days.as_slice()),
        notes: &notes,
    };

    info!(user_id = %user_id, from_week, week = week_number, "generating next week");
    let days = generate_plan(generator, &req).await?;
    save_plan(pool, user_id, week_number, &days).await
}
