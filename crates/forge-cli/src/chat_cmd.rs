//! `forge chat` command: one coaching turn against the current plan.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use forge_core::chat::apply_chat;
use forge_core::llm::TextGenerator;

pub async fn run_chat(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
    message: &str,
) -> Result<()> {
    let response = apply_chat(pool, generator, user_id, message).await?;
    println!("{}", response.reply);
    if response.plan_updated {
        println!();
        println!("Your plan was updated. Run `forge plan show` to see it.");
    }
    Ok(())
}
