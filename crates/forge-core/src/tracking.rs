//! Logged performance and per-exercise notes.

use anyhow::Result;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use forge_db::models::{ExerciseNote, WorkoutLog};
use forge_db::queries::{exercise_notes, plans as plan_queries, workout_logs};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("exercise {0} not found in any of your plans")]
    ExerciseNotFound(Uuid),

    #[error("reps must be >= 0, got {0}")]
    NegativeReps(i32),

    #[error("weight_kg must be >= 0, got {0}")]
    InvalidWeight(f64),

    #[error("exercise name must not be empty")]
    EmptyExerciseName,
}

/// Notes are keyed by exercise name so they survive plan regeneration:
/// trimmed, lower-cased, runs of whitespace collapsed to one space.
pub fn normalize_exercise_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Record what the user actually did for one exercise. Re-logging replaces
/// the previous values.
pub async fn log_performance(
    pool: &PgPool,
    user_id: Uuid,
    exercise_id: Uuid,
    reps: i32,
    weight_kg: f64,
) -> Result<WorkoutLog> {
    if reps < 0 {
        return Err(TrackingError::NegativeReps(reps).into());
    }
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(TrackingError::InvalidWeight(weight_kg).into());
    }
    if !plan_queries::exercise_belongs_to_user(pool, exercise_id, user_id).await? {
        return Err(TrackingError::ExerciseNotFound(exercise_id).into());
    }

    let log = workout_logs::upsert_log(pool, user_id, exercise_id, reps, weight_kg).await?;
    debug!(user_id = %user_id, exercise_id = %exercise_id, reps, weight_kg, "performance logged");
    Ok(log)
}

/// Save (or clear, when `note` is blank) the user's note for an exercise.
/// Returns the stored note, or `None` if it was cleared.
pub async fn save_exercise_note(
    pool: &PgPool,
    user_id: Uuid,
    exercise_name: &str,
    note: &str,
) -> Result<Option<ExerciseNote>> {
    let key = normalize_exercise_name(exercise_name);
    if key.is_empty() {
        return Err(TrackingError::EmptyExerciseName.into());
    }

    let note = note.trim();
    if note.is_empty() {
        let existed = exercise_notes::delete_note(pool, user_id, &key).await?;
        info!(user_id = %user_id, exercise = %key, existed, "exercise note cleared");
        return Ok(None);
    }

    let saved = exercise_notes::upsert_note(pool, user_id, &key, note).await?;
    info!(user_id = %user_id, exercise = %key, "exercise note saved");
    Ok(Some(saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_case_and_space() {
        assert_eq!(normalize_exercise_name("  Barbell   Row "), "barbell row");
        assert_eq!(normalize_exercise_name("Romanian\tDeadlift"), "romanian deadlift");
        assert_eq!(normalize_exercise_name("   "), "");
    }

    #[test]
    fn equivalent_names_share_a_key() {
        assert_eq!(
            normalize_exercise_name("Bench Press"),
            normalize_exercise_name("bench  PRESS")
        );
    }
}
