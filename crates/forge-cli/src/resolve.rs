//! User resolution for `--user`.
//!
//! Accepts either a UUID or an email address and returns the user's ID,
//! failing if no such user exists.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use forge_db::queries::users;

/// Resolve `input` to an existing user's ID.
pub async fn resolve_user(pool: &PgPool, input: &str) -> Result<Uuid> {
    let input = input.trim();
    if looks_like_email(input) {
        let user = users::get_user_by_email(pool, input)
            .await?
            .with_context(|| format!("no user with email {input}"))?;
        return Ok(user.id);
    }

    let id = match Uuid::parse_str(input) {
        Ok(id) => id,
        Err(e) => {
            return Err(e).with_context(|| {
                format!("invalid user: {input:?} (not a UUID and not an email address)")
            });
        }
    };
    match users::get_user(pool, id).await? {
        Some(user) => Ok(user.id),
        None => bail!("user {id} not found"),
    }
}

fn looks_like_email(input: &str) -> bool {
    input
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_detection() {
        assert!(looks_like_email("lifter@example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("lifter@"));
        assert!(!looks_like_email("6f1c2a9e-0000-4000-8000-000000000000"));
    }
}
