//! Plan materialization: render a stored week as a markdown training sheet.
//!
//! - [`materialize_plan`] loads a plan, its logs, and the user's notes and
//!   renders them with [`render_plan_markdown`].
//! - The rendering itself is pure so it can be tested without a database.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use forge_db::models::ExerciseNote;
use forge_db::queries::{exercise_notes, plans as plan_queries, workout_logs};

use super::context::{DayContext, plan_context};
use crate::tracking::normalize_exercise_name;

/// Materialize a plan from the database as markdown.
pub async fn materialize_plan(pool: &PgPool, plan_id: Uuid) -> Result<String> {
    let tree = plan_queries::get_plan_tree(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;
    let logs = workout_logs::list_logs_for_plan(pool, tree.plan.user_id, plan_id).await?;
    let notes = exercise_notes::list_notes(pool, tree.plan.user_id).await?;

    let days = plan_context(&tree, &logs);
    Ok(render_plan_markdown(tree.plan.week_number, &days, &notes))
}

/// Render one week as markdown: a table per day, logged actuals beside the
/// prescription (flagged when they fell short), and any saved notes under
/// the exercise they belong to.
pub fn render_plan_markdown(week_number: i32, days: &[DayContext], notes: &[ExerciseNote]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Week {week_number}\n"));

    for day in days {
        out.push_str(&format!("\n## Day {}: {}\n\n", day.day_index + 1, day.label));

        if day.exercises.is_empty() {
            out.push_str("_Rest day._\n");
            continue;
        }

        out.push_str("| # | Exercise | Sets x Reps | Weight | Logged |\n");
        out.push_str("|---|----------|-------------|--------|--------|\n");
        for (i, ex) in day.exercises.iter().enumerate() {
            let name = if ex.is_compound {
                format!("**{}**", escape_cell(&ex.name))
            } else {
                escape_cell(&ex.name)
            };
            let logged = match (ex.actual_reps, ex.actual_weight_kg) {
                (Some(reps), Some(weight)) => {
                    let short = if ex.met_prescription() == Some(true) { "" } else { " (short)" };
                    format!("{reps} @ {}{short}", format_kg(weight))
                }
                _ => "-".to_owned(),
            };
            out.push_str(&format!(
                "| {} | {} | {} x {} | {} | {} |\n",
                i + 1,
                name,
                ex.sets,
                ex.reps,
                format_kg(ex.weight_kg),
                logged
            ));
        }

        let mut annotations = Vec::new();
        for ex in &day.exercises {
            if !ex.notes.is_empty() {
                annotations.push(format!("- {}: {}", ex.name, ex.notes));
            }
            let key = normalize_exercise_name(&ex.name);
            if let Some(note) = notes.iter().find(|n| n.exercise_key == key) {
                annotations.push(format!("- {} (my note): {}", ex.name, note.note));
            }
        }
        if !annotations.is_empty() {
            out.push('\n');
            out.push_str(&annotations.join("\n"));
            out.push('\n');
        }
    }

    out
}

/// `80` -> `80 kg`, `82.5` -> `82.5 kg`, `0` -> `bodyweight`.
fn format_kg(weight: f64) -> String {
    if weight == 0.0 {
        "bodyweight".to_owned()
    } else {
        format!("{weight} kg")
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::plan::context::ExerciseContext;

    fn ex(name: &str, weight: f64, compound: bool) -> ExerciseContext {
        ExerciseContext {
            name: name.into(),
            sets: 3,
            reps: 10,
            weight_kg: weight,
            is_compound: compound,
            notes: String::new(),
            actual_reps: None,
            actual_weight_kg: None,
        }
    }

    #[test]
    fn renders_table_with_actuals() {
        let mut squat = ex("Back Squat", 100.0, true);
        squat.actual_reps = Some(8);
        squat.actual_weight_kg = Some(97.5);
        let days = vec![DayContext {
            day_index: 0,
            label: "Lower A".into(),
            exercises: vec![squat, ex("Plank", 0.0, false)],
        }];

        let md = render_plan_markdown(2, &days, &[]);
        assert!(md.starts_with("# Week 2\n"));
        assert!(md.contains("## Day 1: Lower A"));
        assert!(md.contains("| 1 | **Back Squat** | 3 x 10 | 100 kg | 8 @ 97.5 kg (short) |"));
        assert!(md.contains("| 2 | Plank | 3 x 10 | bodyweight | - |"));
    }

    #[test]
    fn prescription_met_is_not_flagged() {
        let mut bench = ex("Bench Press", 80.0, true);
        bench.actual_reps = Some(10);
        bench.actual_weight_kg = Some(82.5);
        let days = vec![DayContext {
            day_index: 0,
            label: "Push".into(),
            exercises: vec![bench],
        }];

        let md = render_plan_markdown(1, &days, &[]);
        assert!(md.contains("| 10 @ 82.5 kg |"));
        assert!(!md.contains("(short)"));
    }

    #[test]
    fn notes_attach_by_normalized_name() {
        let mut row = ex("Barbell  Row", 60.0, true);
        row.notes = "pause at chest".into();
        let days = vec![DayContext {
            day_index: 1,
            label: "Pull".into(),
            exercises: vec![row],
        }];
        let notes = vec![ExerciseNote {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            exercise_key: "barbell row".into(),
            note: "straps from set 3".into(),
            updated_at: Utc::now(),
        }];

        let md = render_plan_markdown(1, &days, &notes);
        assert!(md.contains("- Barbell  Row: pause at chest"));
        assert!(md.contains("- Barbell  Row (my note): straps from set 3"));
    }

    #[test]
    fn empty_day_is_rest() {
        let days = vec![DayContext {
            day_index: 0,
            label: "Recovery".into(),
            exercises: vec![],
        }];
        assert!(render_plan_markdown(1, &days, &[]).contains("_Rest day._"));
    }

    #[test]
    fn pipes_are_escaped() {
        assert_eq!(escape_cell("A|B"), "A\\|B");
    }
}
