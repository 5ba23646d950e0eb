//! Conversational plan editor.
//!
//! A single model call answers the user's message. When the user asked for
//! a change, the reply carries the complete modified week inside sentinel
//! tags, and [`apply_chat`] swaps it into the current plan atomically.

use std::fmt::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use forge_db::queries::profiles;

use super::sentinel::{CLOSE_TAG, Extraction, OPEN_TAG, PlanPayload, extract_plan_block};
use crate::llm::{CompletionRequest, TextGenerator};
use crate::plan::contract::DayPlan;
use crate::plan::context::DayContext;
use crate::plan::generate::GenerationError;
use crate::plan::prompt::CONTRACT_EXAMPLE;
use crate::plan::service::{current_context, replace_plan_days};
use crate::profile::ProfileSnapshot;

/// Shown when the model's reply was nothing but a plan block that was applied.
const UPDATED_FALLBACK_REPLY: &str = "Done. Your plan has been updated.";

/// Shown when the model's reply was nothing but a plan block that could not
/// be applied.
const UNCHANGED_FALLBACK_REPLY: &str =
    "Your plan was not changed. Complete onboarding to generate a plan first.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyMessage,
}

/// Outcome of one chat turn before anything is persisted. `reply` is empty
/// when the model sent nothing but a plan block.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub reply: String,
    pub replacement: Option<Vec<DayPlan>>,
}

/// What the caller sees after a chat turn is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub plan_updated: bool,
}

/// System prompt for the coaching chat: athlete facts, the current week as
/// JSON, and the rules for returning a modified plan.
pub fn build_chat_system_prompt(
    profile: Option<&ProfileSnapshot>,
    plan: Option<&[DayContext]>,
) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(
        "You are ForgeFit's AI coach: an expert certified personal trainer and strength coach. \
         Answer training, technique, recovery and nutrition questions concisely and practically.\n",
    );

    if let Some(p) = profile {
        out.push_str("\nAthlete profile:\n");
        let _ = writeln!(out, "- Height: {}cm, Weight: {}kg", p.height_cm, p.weight_kg);
        let _ = writeln!(out, "- Goal: {} [{}]", p.goal.description(), p.goal);
        let _ = writeln!(out, "- Plan type: {} [{}]", p.plan_type.label(), p.plan_type);
        let _ = writeln!(out, "- Days per week: {}", p.days_per_week);
        let _ = writeln!(
            out,
            "- 1RM - Squat: {}kg, Bench Press: {}kg, Deadlift: {}kg, Overhead Press: {}kg",
            p.squat_1rm, p.bench_1rm, p.deadlift_1rm, p.ohp_1rm
        );
    }

    match plan {
        Some(days) => {
            let current = serde_json::to_string_pretty(days).unwrap_or_default();
            out.push_str("\nThe athlete's current workout plan:\n");
            out.push_str(&current);
            out.push('\n');
            let _ = write!(
                out,
                "\nIf, and only if, the athlete asks you to change the plan (swap, add or remove \
                 exercises, change sets, reps or weights, move days), reply with a short explanation \
                 followed by the COMPLETE modified plan wrapped in {OPEN_TAG}...{CLOSE_TAG} tags. \
                 Include every day, not just the changed ones, in exactly this format:\n\
                 {CONTRACT_EXAMPLE}\n\
                 Never include the tags when no change was requested.\n"
            );
        }
        None => {
            out.push_str(
                "\nThe athlete has no workout plan yet. You cannot modify a plan; \
                 suggest completing onboarding to generate one.\n",
            );
        }
    }

    out
}

/// Run one chat turn. A malformed plan block is dropped (logged at debug)
/// and never reaches the user.
pub async fn chat(
    generator: &dyn TextGenerator,
    message: &str,
    profile: Option<&ProfileSnapshot>,
    plan: Option<&[DayContext]>,
) -> Result<ChatOutcome, GenerationError> {
    let system = build_chat_system_prompt(profile, plan);
    let raw = generator
        .complete(&CompletionRequest::single(system, message))
        .await?;

    let Extraction {
        visible_reply,
        payload,
    } = extract_plan_block(&raw);

    let replacement = match payload {
        PlanPayload::Absent => None,
        PlanPayload::Valid(days) => Some(days),
        PlanPayload::Malformed(err) => {
            debug!(error = %err, "discarding malformed plan block from chat reply");
            None
        }
    };

    Ok(ChatOutcome {
        reply: visible_reply,
        replacement,
    })
}

/// Load the user's profile and current plan, chat, and apply any valid
/// replacement to the current plan in one transaction.
pub async fn apply_chat(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
    message: &str,
) -> Result<ChatResponse> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage.into());
    }

    let profile = profiles::get_profile(pool, user_id)
        .await?
        .map(|p| ProfileSnapshot::from(&p));
    let current = current_context(pool, user_id).await?;

    let outcome = chat(
        generator,
        message,
        profile.as_ref(),
        current.as_ref().map(|(_, days)| days.as_slice()),
    )
    .await?;

    let plan_updated = match (outcome.replacement, &current) {
        (Some(days), Some((tree, _))) => {
            replace_plan_days(pool, tree.plan.id, &days).await?;
            info!(
                user_id = %user_id,
                plan_id = %tree.plan.id,
                week = tree.plan.week_number,
                "plan modified from chat"
            );
            true
        }
        _ => false,
    };

    let reply = match (outcome.reply.is_empty(), plan_updated) {
        (true, true) => UPDATED_FALLBACK_REPLY.to_owned(),
        (true, false) => UNCHANGED_FALLBACK_REPLY.to_owned(),
        (false, _) => outcome.reply,
    };

    Ok(ChatResponse {
        reply,
        plan_updated,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use forge_db::models::{Goal, PlanType};

    use super::*;
    use crate::llm::LlmError;
    use crate::plan::context::ExerciseContext;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            Ok(self.0.to_owned())
        }
    }

    fn current() -> Vec<DayContext> {
        vec![DayContext {
            day_index: 0,
            label: "Push".into(),
            exercises: vec![ExerciseContext {
                name: "Bench Press".into(),
                sets: 4,
                reps: 6,
                weight_kg: 80.0,
                is_compound: true,
                notes: String::new(),
                actual_reps: None,
                actual_weight_kg: None,
            }],
        }]
    }

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            height_cm: 172.0,
            weight_kg: 68.5,
            goal: Goal::General,
            plan_type: PlanType::PushPullLegs,
            days_per_week: 3,
            squat_1rm: 90.0,
            bench_1rm: 70.0,
            deadlift_1rm: 120.0,
            ohp_1rm: 45.0,
        }
    }

    #[test]
    fn system_prompt_embeds_plan_and_protocol() {
        let plan = current();
        let p = profile();
        let prompt = build_chat_system_prompt(Some(&p), Some(&plan));
        assert!(prompt.contains("\"name\": \"Bench Press\""));
        assert!(prompt.contains("<plan_json>...</plan_json>"));
        assert!(prompt.contains("COMPLETE modified plan"));
        assert!(prompt.contains("Weight: 68.5kg"));
        assert!(prompt.contains("[push_pull_legs]"));
    }

    #[test]
    fn system_prompt_without_plan_forbids_edits() {
        let prompt = build_chat_system_prompt(None, None);
        assert!(prompt.contains("no workout plan yet"));
        assert!(!prompt.contains("<plan_json>"));
    }

    #[tokio::test]
    async fn plain_answer_has_no_replacement() {
        let plan = current();
        let out = chat(&Canned("Rest 2-3 minutes between heavy sets."), "rest?", None, Some(&plan))
            .await
            .unwrap();
        assert_eq!(out.reply, "Rest 2-3 minutes between heavy sets.");
        assert!(out.replacement.is_none());
    }

    #[tokio::test]
    async fn valid_block_becomes_replacement() {
        let plan = current();
        let reply = r#"Swapped to dumbbells.
<plan_json>[{"day_index": 0, "label": "Push", "exercises": [{"name": "Dumbbell Bench Press", "sets": 4, "reps": 8, "weight_kg": 30, "is_compound": true, "notes": "per hand"}]}]</plan_json>"#;
        let out = chat(&Canned(reply), "use dumbbells", None, Some(&plan)).await.unwrap();
        assert_eq!(out.reply, "Swapped to dumbbells.");
        let days = out.replacement.unwrap();
        assert_eq!(days[0].exercises[0].name, "Dumbbell Bench Press");
    }

    #[tokio::test]
    async fn malformed_block_is_silently_dropped() {
        let plan = current();
        let out = chat(
            &Canned("Sure thing! <plan_json>[{\"day_index\": 0}]</plan_json>"),
            "change it",
            None,
            Some(&plan),
        )
        .await
        .unwrap();
        assert_eq!(out.reply, "Sure thing!");
        assert!(out.replacement.is_none());
    }

    #[tokio::test]
    async fn bare_block_leaves_reply_empty() {
        let out = chat(
            &Canned(r#"<plan_json>[{"day_index": 0, "label": "Push", "exercises": []}]</plan_json>"#),
            "clear day one",
            None,
            None,
        )
        .await
        .unwrap();
        assert!(out.reply.is_empty());
        assert!(out.replacement.is_some());
    }
}
