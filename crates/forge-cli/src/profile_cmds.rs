//! `forge profile` subcommands.
//!
//! - `forge profile set ...` -- save body metrics and benchmarks, then
//!   generate a fresh week 1 (unless `--skip-plan`)
//! - `forge profile show`    -- print the profile and derived macro targets

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use forge_core::llm::TextGenerator;
use forge_core::plan;
use forge_core::profile::{ProfileSnapshot, save_profile};
use forge_db::models::Profile;
use forge_db::queries::profiles;

use crate::ProfileCommands;

pub async fn run_profile_command(
    command: ProfileCommands,
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
) -> Result<()> {
    match command {
        ProfileCommands::Set {
            height_cm,
            weight_kg,
            goal,
            plan_type,
            days_per_week,
            squat,
            bench,
            deadlift,
            ohp,
            skip_plan,
        } => {
            let snapshot = ProfileSnapshot {
                height_cm,
                weight_kg,
                goal,
                plan_type,
                days_per_week,
                squat_1rm: squat,
                bench_1rm: bench,
                deadlift_1rm: deadlift,
                ohp_1rm: ohp,
            };
            cmd_set(pool, generator, user_id, &snapshot, skip_plan).await
        }
        ProfileCommands::Show => cmd_show(pool, user_id).await,
    }
}

async fn cmd_set(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
    snapshot: &ProfileSnapshot,
    skip_plan: bool,
) -> Result<()> {
    if skip_plan {
        let profile = save_profile(pool, user_id, snapshot).await?;
        println!("Profile saved.");
        print_profile(&profile);
        return Ok(());
    }

    let existing = profiles::get_profile(pool, user_id).await?;
    println!("Generating week 1 with {}...", generator.name());
    let out = match existing {
        Some(_) => plan::regenerate_from_profile(pool, generator, user_id, snapshot).await?,
        None => plan::onboard(pool, generator, user_id, snapshot).await?,
    };

    println!("Profile saved.");
    print_profile(&out.profile);
    println!();
    println!("Week {} plan created: {}", out.plan.week_number, out.plan.id);
    println!("Run `forge plan show` to see it.");
    Ok(())
}

async fn cmd_show(pool: &PgPool, user_id: Uuid) -> Result<()> {
    match profiles::get_profile(pool, user_id).await? {
        Some(profile) => print_profile(&profile),
        None => println!("No profile yet. Use `forge profile set` to create one."),
    }
    Ok(())
}

fn print_profile(p: &Profile) {
    println!("  Height:        {}cm", p.height_cm);
    println!("  Weight:        {}kg", p.weight_kg);
    println!("  Goal:          {} ({})", p.goal, p.goal.description());
    println!("  Plan type:     {} ({})", p.plan_type, p.plan_type.label());
    println!("  Days per week: {}", p.days_per_week);
    println!(
        "  1RM:           squat {}kg, bench {}kg, deadlift {}kg, ohp {}kg",
        p.squat_1rm, p.bench_1rm, p.deadlift_1rm, p.ohp_1rm
    );
    println!(
        "  Daily targets: {} kcal, {}g protein, {}g carbs, {}g fat",
        p.calorie_target, p.protein_target_g, p.carbs_target_g, p.fat_target_g
    );
}
