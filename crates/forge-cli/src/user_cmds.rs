//! `forge user` subcommands.

use anyhow::{Result, bail};
use sqlx::PgPool;

use forge_db::queries::users;

use crate::UserCommands;

pub async fn run_user_command(command: UserCommands, pool: &PgPool) -> Result<()> {
    match command {
        UserCommands::Create { email } => cmd_create(pool, &email).await,
    }
}

async fn cmd_create(pool: &PgPool, email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        bail!("invalid email address: {email:?}");
    }
    let user = match users::insert_user(pool, email).await {
        Ok(user) => user,
        Err(err) if users::is_duplicate_email(&err) => {
            bail!("a user with email {email} already exists")
        }
        Err(err) => return Err(err),
    };
    println!("User created.");
    println!("  ID:    {}", user.id);
    println!("  Email: {}", user.email);
    println!();
    println!("Next: `forge --user {} profile set ...`", user.email);
    Ok(())
}
