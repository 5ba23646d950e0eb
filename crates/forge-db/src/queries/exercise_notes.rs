//! Database query functions for the `exercise_notes` table.
//!
//! Keys are normalized exercise names; normalization happens in the caller.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ExerciseNote;

/// Insert or replace the note for `(user_id, exercise_key)`.
pub async fn upsert_note(
    pool: &PgPool,
    user_id: Uuid,
    exercise_key: &str,
    note: &str,
) -> Result<ExerciseNote> {
    let row = sqlx::query_as::<_, ExerciseNote>(
        "INSERT INTO exercise_notes (user_id, exercise_key, note) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, exercise_key) DO UPDATE SET \
             note = EXCLUDED.note, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(exercise_key)
    .bind(note)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to save note for {exercise_key:?}"))?;

    Ok(row)
}

/// Delete the note for `(user_id, exercise_key)`. Returns whether a row
/// existed.
pub async fn delete_note(pool: &PgPool, user_id: Uuid, exercise_key: &str) -> Result<bool> {
    let result =
        sqlx::query("DELETE FROM exercise_notes WHERE user_id = $1 AND exercise_key = $2")
            .bind(user_id)
            .bind(exercise_key)
            .execute(pool)
            .await
            .context("failed to delete exercise note")?;

    Ok(result.rows_affected() > 0)
}

/// List all of a user's notes, ordered by key.
pub async fn list_notes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ExerciseNote>> {
    let notes = sqlx::query_as::<_, ExerciseNote>(
        "SELECT * FROM exercise_notes WHERE user_id = $1 ORDER BY exercise_key",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list exercise notes")?;

    Ok(notes)
}
