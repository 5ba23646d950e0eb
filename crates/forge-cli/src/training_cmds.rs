//! `forge log` and `forge note` commands.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use forge_core::tracking::{log_performance, save_exercise_note};
use forge_db::queries::exercise_notes;

use crate::NoteCommands;

/// Record actual reps and weight for one exercise of the user's plans.
pub async fn run_log(
    pool: &PgPool,
    user_id: Uuid,
    exercise_id: &str,
    reps: i32,
    weight_kg: f64,
) -> Result<()> {
    let id = Uuid::parse_str(exercise_id)
        .with_context(|| format!("invalid exercise ID: {exercise_id}"))?;
    let log = log_performance(pool, user_id, id, reps, weight_kg).await?;
    println!("Logged {} reps @ {}kg.", log.reps, log.weight_kg);
    Ok(())
}

pub async fn run_note_command(command: NoteCommands, pool: &PgPool, user_id: Uuid) -> Result<()> {
    match command {
        NoteCommands::Set { exercise, note } => {
            match save_exercise_note(pool, user_id, &exercise, &note).await? {
                Some(saved) => println!("Note saved for {}.", saved.exercise_key),
                None => println!("Note cleared for {}.", exercise.trim()),
            }
        }
        NoteCommands::List => {
            let notes = exercise_notes::list_notes(pool, user_id).await?;
            if notes.is_empty() {
                println!("No notes. Use `forge note set <exercise> <note>` to add one.");
                return Ok(());
            }
            let key_w = notes.iter().map(|n| n.exercise_key.len()).max().unwrap_or(8);
            for n in &notes {
                println!("  {:<key_w$}  {}", n.exercise_key, n.note);
            }
        }
    }
    Ok(())
}
