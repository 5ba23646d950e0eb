//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Insert a new user. The email is trimmed and lower-cased first.
///
/// A duplicate email is rejected by the UNIQUE constraint.
pub async fn insert_user(pool: &PgPool, email: &str) -> Result<User> {
    let email = email.trim().to_lowercase();
    let user = sqlx::query_as::<_, User>("INSERT INTO users (email) VALUES ($1) RETURNING *")
        .bind(&email)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to insert user {email:?}"))?;

    Ok(user)
}

/// Whether `err` came from the UNIQUE constraint on `users.email`.
pub fn is_duplicate_email(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .is_some_and(|db| db.is_unique_violation())
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by (normalized) email.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}
