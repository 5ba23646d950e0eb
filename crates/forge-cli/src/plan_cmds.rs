//! CLI handlers for `forge plan` subcommands.
//!
//! Implements:
//! - `forge plan generate`  -- generate week 1 from the saved profile
//! - `forge plan next-week` -- generate week N+1 from the current plan
//! - `forge plan show`      -- print the current plan with exercise IDs
//! - `forge plan export`    -- render the current plan as markdown

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use forge_core::llm::TextGenerator;
use forge_core::plan::{self, PlanServiceError, materialize_plan, plan_context};
use forge_db::models::WorkoutPlan;
use forge_db::queries::{profiles, workout_logs};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(
    command: PlanCommands,
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
) -> Result<()> {
    match command {
        PlanCommands::Generate => cmd_generate(pool, generator, user_id).await,
        PlanCommands::NextWeek => cmd_next_week(pool, generator, user_id).await,
        PlanCommands::Show => cmd_show(pool, user_id).await,
        PlanCommands::Export { output } => cmd_export(pool, user_id, output.as_deref()).await,
    }
}

// -----------------------------------------------------------------------
// forge plan generate / next-week
// -----------------------------------------------------------------------

async fn cmd_generate(pool: &PgPool, generator: &dyn TextGenerator, user_id: Uuid) -> Result<()> {
    let profile = profiles::get_profile(pool, user_id)
        .await?
        .ok_or(PlanServiceError::NoProfile(user_id))?;

    println!("Generating week 1 with {}...", generator.name());
    let created = plan::generate_first_week(pool, generator, &profile).await?;
    print_created(&created);
    Ok(())
}

async fn cmd_next_week(pool: &PgPool, generator: &dyn TextGenerator, user_id: Uuid) -> Result<()> {
    println!("Generating next week with {}...", generator.name());
    let created = plan::generate_next_week(pool, generator, user_id).await?;
    print_created(&created);
    Ok(())
}

fn print_created(created: &WorkoutPlan) {
    println!("Plan created.");
    println!();
    println!("  Plan ID: {}", created.id);
    println!("  Week:    {}", created.week_number);
}

// -----------------------------------------------------------------------
// forge plan show
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let Some(tree) = plan::current_plan(pool, user_id).await? else {
        println!("No plan yet. Use `forge profile set` or `forge plan generate`.");
        return Ok(());
    };
    let logs = workout_logs::list_logs_for_plan(pool, user_id, tree.plan.id).await?;
    let context = plan_context(&tree, &logs);

    println!("Week {} ({})", tree.plan.week_number, tree.plan.id);
    println!(
        "Created: {}",
        tree.plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let name_w = tree
        .days
        .iter()
        .flat_map(|d| d.exercises.iter())
        .map(|e| e.name.len())
        .max()
        .unwrap_or(8)
        .max(8);

    for (day, day_ctx) in tree.days.iter().zip(&context) {
        println!();
        println!("Day {}: {}", day.day.day_index + 1, day.day.label);
        if day.exercises.is_empty() {
            println!("  (rest)");
            continue;
        }
        for (ex, ex_ctx) in day.exercises.iter().zip(&day_ctx.exercises) {
            let logged = match (ex_ctx.actual_reps, ex_ctx.actual_weight_kg) {
                (Some(reps), Some(weight)) => format!("logged {reps} @ {weight}kg"),
                _ => String::new(),
            };
            let marker = if ex.is_compound { "*" } else { " " };
            println!(
                "  {id}  {marker}{name:<name_w$}  {sets}x{reps} @ {weight}kg  {logged}",
                id = ex.id,
                name = ex.name,
                sets = ex.sets,
                reps = ex.reps,
                weight = ex.weight_kg,
            );
        }
    }

    println!();
    println!("* compound lift. Log with `forge log <exercise-id> --reps N --weight-kg W`.");
    Ok(())
}

// -----------------------------------------------------------------------
// forge plan export
// -----------------------------------------------------------------------

async fn cmd_export(pool: &PgPool, user_id: Uuid, output: Option<&str>) -> Result<()> {
    let tree = plan::current_plan(pool, user_id)
        .await?
        .ok_or(PlanServiceError::NoPlan(user_id))?;
    let markdown = materialize_plan(pool, tree.plan.id).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &markdown)
                .with_context(|| format!("cannot write output file: {path}"))?;
            println!("Week {} written to {path}", tree.plan.week_number);
        }
        None => print!("{markdown}"),
    }
    Ok(())
}
