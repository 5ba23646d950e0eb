use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/forge-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by forge, parents before children.
pub const FORGE_TABLES: &[&str] = &[
    "users",
    "profiles",
    "workout_plans",
    "workout_days",
    "exercises",
    "workout_logs",
    "exercise_notes",
    "food_logs",
    "water_logs",
];

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// PostgreSQL truncates identifiers past this many bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Row count of one forge table, as reported by `forge db-init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRows {
    pub table: &'static str,
    pub rows: i64,
}

/// Connect to the forge database. A URL without a database name is refused
/// before any connection is attempted.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let db_name = config
        .database_name()
        .with_context(|| format!("no database name in URL {}", config.database_url))?;

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("cannot reach forge database {db_name}"))?;
    debug!(db = db_name, "connection pool ready");
    Ok(pool)
}

/// Apply pending migrations and return the schema version now in place.
pub async fn run_migrations(pool: &PgPool) -> Result<i64> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to migrate forge schema")?;

    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await
            .context("failed to read schema version")?;
    let version = version.unwrap_or(0);

    info!(schema_version = version, "forge schema up to date");
    Ok(version)
}

/// Check that `name` can be spliced into `CREATE DATABASE` as a bare
/// identifier.
pub fn validate_database_name(name: &str) -> Result<()> {
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let rest_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !starts_ok || !rest_ok || name.len() > MAX_IDENTIFIER_LEN {
        bail!(
            "database name {name:?} must be lowercase letters, digits or '_', \
             not start with a digit, and be at most {MAX_IDENTIFIER_LEN} bytes"
        );
    }
    Ok(())
}

/// Create the forge database on its server when missing. Returns `true` if
/// it was created by this call.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config
        .database_name()
        .with_context(|| format!("no database name in URL {}", config.database_url))?;
    validate_database_name(db_name)?;

    let admin_url = config.maintenance_url();
    let admin = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&admin_url)
        .await
        .with_context(|| format!("cannot reach server admin database at {admin_url}"))?;

    let present: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&admin)
            .await
            .context("failed to look up database")?;

    if !present {
        admin
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "created forge database");
    }

    admin.close().await;
    Ok(!present)
}

/// Row counts for every table in [`FORGE_TABLES`], in that order.
pub async fn row_counts(pool: &PgPool) -> Result<Vec<TableRows>> {
    let mut out = Vec::with_capacity(FORGE_TABLES.len());
    for &table in FORGE_TABLES {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        out.push(TableRows { table, rows });
    }
    Ok(out)
}
