mod chat_cmd;
mod config;
mod food_cmds;
mod plan_cmds;
mod profile_cmds;
mod resolve;
mod serve_cmd;
mod training_cmds;
mod user_cmds;

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use forge_core::llm::anthropic::AnthropicClient;
use forge_core::nutrition::OpenFoodFactsClient;
use forge_db::models::{Goal, PlanType};
use forge_db::pool;

use config::ForgeConfig;

#[derive(Parser)]
#[command(name = "forge", about = "Strength training planner with AI-generated weekly plans")]
struct Cli {
    /// Database URL (overrides FORGE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// User to act as: a user ID or an email address
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a forge config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/forge")]
        db_url: String,
        /// Model name to request from the Anthropic API
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the forge database (requires config file or env vars)
    DbInit,
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// User accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Body metrics, benchmarks, and macro targets
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Weekly training plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Record what you actually did for an exercise
    Log {
        /// Exercise ID (see `forge plan show`)
        exercise_id: String,
        /// Reps completed
        #[arg(long)]
        reps: i32,
        /// Weight used, in kg
        #[arg(long)]
        weight_kg: f64,
    },
    /// Per-exercise notes carried into future plans
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Ask the coach a question or request a plan change
    Chat {
        /// Message to send
        message: String,
    },
    /// Food logging and lookup
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Water logging
    Water {
        #[command(subcommand)]
        command: WaterCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account
    Create {
        /// Email address (must be unique)
        email: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Save the profile and generate a fresh week 1
    Set {
        #[arg(long)]
        height_cm: f64,
        #[arg(long)]
        weight_kg: f64,
        /// muscle, strength, or general
        #[arg(long)]
        goal: Goal,
        /// push_pull_legs, upper_lower, full_body, menstrual_cycle, or bro_split
        #[arg(long)]
        plan_type: PlanType,
        #[arg(long)]
        days_per_week: i32,
        /// Squat one-rep max, kg
        #[arg(long)]
        squat: f64,
        /// Bench press one-rep max, kg
        #[arg(long)]
        bench: f64,
        /// Deadlift one-rep max, kg
        #[arg(long)]
        deadlift: f64,
        /// Overhead press one-rep max, kg
        #[arg(long)]
        ohp: f64,
        /// Save the profile without generating a plan
        #[arg(long)]
        skip_plan: bool,
    },
    /// Show the profile and macro targets
    Show,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate week 1 from the saved profile
    Generate,
    /// Generate next week from the current plan and logged performance
    NextWeek,
    /// Show the current plan with exercise IDs
    Show,
    /// Write the current plan as markdown
    Export {
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Save a note for an exercise (an empty note clears it)
    Set {
        /// Exercise name, e.g. "Back Squat"
        exercise: String,
        /// Note text
        note: String,
    },
    /// List saved notes
    List,
}

#[derive(Subcommand)]
pub enum FoodCommands {
    /// Search OpenFoodFacts by name
    Search {
        /// Search text
        query: String,
    },
    /// Look up a product by barcode
    Barcode {
        /// EAN/UPC digits
        code: String,
    },
    /// Log a food entry from per-100 g values
    Add {
        /// Food name
        name: String,
        /// Serving eaten, in grams
        #[arg(long)]
        serving_g: f64,
        /// kcal per 100 g
        #[arg(long)]
        cal: f64,
        /// Protein per 100 g
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        /// Carbohydrate per 100 g
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        /// Fat per 100 g
        #[arg(long, default_value_t = 0.0)]
        fat: f64,
    },
    /// List a day's entries with totals against targets
    List {
        /// Day to list (YYYY-MM-DD, UTC); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a food entry
    Delete {
        /// Entry ID
        entry_id: String,
    },
}

#[derive(Subcommand)]
pub enum WaterCommands {
    /// Log water intake
    Add {
        /// Amount in ml
        amount_ml: i32,
    },
    /// Show today's water total
    Today,
}

/// Execute the `forge init` command: write config file.
fn cmd_init(db_url: &str, model: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut model_section = config::ModelSection::default();
    if let Some(name) = model {
        model_section.name = name.to_owned();
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
        model: model_section,
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  model.name = {}", cfg.model.name);
    println!();
    println!("Next: run `forge db-init` to create and migrate the database.");
    println!("Plan generation and chat read the API key from ANTHROPIC_API_KEY.");

    Ok(())
}

/// Execute the `forge db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &ForgeConfig) -> anyhow::Result<()> {
    println!("Initializing forge database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database.");
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let version = pool::run_migrations(&db_pool).await?;

    let counts = pool::row_counts(&db_pool).await?;
    println!("Database ready (schema version {version}). Tables:");
    for t in &counts {
        println!("  {}: {} rows", t.table, t.rows);
    }

    db_pool.close().await;

    println!("forge db-init complete.");
    Ok(())
}

/// Model client configured from the resolved config. The API key comes from
/// the environment only.
fn text_generator(resolved: &ForgeConfig) -> AnthropicClient {
    AnthropicClient::from_env()
        .with_model(&resolved.model.name)
        .with_base_url(&resolved.model.base_url)
}

async fn require_user(pool: &PgPool, user: Option<&str>) -> anyhow::Result<Uuid> {
    let input = user.context("this command needs --user <id-or-email>")?;
    resolve::resolve_user(pool, input).await
}

async fn run(cli: Cli, resolved: &ForgeConfig, db_pool: &PgPool) -> anyhow::Result<()> {
    let user = cli.user.as_deref();
    match cli.command {
        Commands::Init { .. } | Commands::DbInit => Ok(()),
        Commands::Serve { bind, port } => {
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                generator: Arc::new(text_generator(resolved)),
                food: Arc::new(OpenFoodFactsClient::new()),
            };
            serve_cmd::run_serve(state, &bind, port).await
        }
        Commands::User { command } => user_cmds::run_user_command(command, db_pool).await,
        Commands::Profile { command } => {
            let user_id = require_user(db_pool, user).await?;
            let generator = text_generator(resolved);
            profile_cmds::run_profile_command(command, db_pool, &generator, user_id).await
        }
        Commands::Plan { command } => {
            let user_id = require_user(db_pool, user).await?;
            let generator = text_generator(resolved);
            plan_cmds::run_plan_command(command, db_pool, &generator, user_id).await
        }
        Commands::Log {
            exercise_id,
            reps,
            weight_kg,
        } => {
            let user_id = require_user(db_pool, user).await?;
            training_cmds::run_log(db_pool, user_id, &exercise_id, reps, weight_kg).await
        }
        Commands::Note { command } => {
            let user_id = require_user(db_pool, user).await?;
            training_cmds::run_note_command(command, db_pool, user_id).await
        }
        Commands::Chat { message } => {
            let user_id = require_user(db_pool, user).await?;
            let generator = text_generator(resolved);
            chat_cmd::run_chat(db_pool, &generator, user_id, &message).await
        }
        Commands::Food { command } => {
            let lookup = OpenFoodFactsClient::new();
            match command {
                FoodCommands::Search { .. } | FoodCommands::Barcode { .. } => {
                    food_cmds::run_food_command(command, db_pool, &lookup, None).await
                }
                _ => {
                    let user_id = require_user(db_pool, user).await?;
                    food_cmds::run_food_command(command, db_pool, &lookup, Some(user_id)).await
                }
            }
        }
        Commands::Water { command } => {
            let user_id = require_user(db_pool, user).await?;
            food_cmds::run_water_command(command, db_pool, user_id).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init {
            db_url,
            model,
            force,
        } => {
            cmd_init(db_url, model.as_deref(), *force)?;
        }
        Commands::DbInit => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref());
            cmd_db_init(&resolved).await?;
        }
        _ => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = run(cli, &resolved, &db_pool).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
