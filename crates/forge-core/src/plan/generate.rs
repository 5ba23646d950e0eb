//! One-shot plan generation: prompt, single model call, contract parse.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::contract::{ContractError, DayPlan, parse_plan_contract};
use super::prompt::{GenerationRequest, build_generation_prompt};
use crate::llm::{CompletionRequest, LlmError, TextGenerator};

/// System prompt for plan generation.
pub const COACH_SYSTEM_PROMPT: &str = "You are an expert certified personal trainer and strength coach. \
Generate structured workout plans as JSON only. No explanations, no markdown fences, just the JSON array.";

/// Why a generation (or chat) call produced no usable plan.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),

    #[error("model call failed: {0}")]
    Model(String),

    #[error("model returned a plan that violates the contract: {0}")]
    Malformed(#[from] ContractError),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingCredential(var) => Self::MissingCredential(var),
            other => Self::Model(other.to_string()),
        }
    }
}

/// Generate one week of training. Nothing is persisted here.
pub async fn generate_plan(
    generator: &dyn TextGenerator,
    req: &GenerationRequest<'_>,
) -> Result<Vec<DayPlan>, GenerationError> {
    let prompt = build_generation_prompt(req);
    debug!(
        week = req.week_number,
        progression = req.is_progression(),
        prompt_len = prompt.len(),
        "generation prompt built"
    );

    let reply = generator
        .complete(&CompletionRequest::single(COACH_SYSTEM_PROMPT, prompt))
        .await?;

    let days = parse_plan_contract(&reply).inspect_err(|e| {
        warn!(week = req.week_number, model = generator.name(), error = %e, "generated plan rejected");
    })?;

    info!(
        week = req.week_number,
        days = days.len(),
        exercises = days.iter().map(|d| d.exercises.len()).sum::<usize>(),
        "plan generated"
    );
    Ok(days)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use forge_db::models::{Goal, PlanType};

    use super::*;
    use crate::profile::ProfileSnapshot;

    struct Scripted {
        reply: Result<String, LlmError>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Scripted {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_owned()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(LlmError::MissingCredential(v)) => Err(LlmError::MissingCredential(*v)),
                Err(e) => Err(LlmError::Transport(e.to_string())),
            }
        }
    }

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            height_cm: 165.0,
            weight_kg: 60.0,
            goal: Goal::Muscle,
            plan_type: PlanType::FullBody,
            days_per_week: 2,
            squat_1rm: 80.0,
            bench_1rm: 50.0,
            deadlift_1rm: 100.0,
            ohp_1rm: 35.0,
        }
    }

    const TWO_DAYS: &str = r#"```json
[{"day_index": 0, "label": "Full Body A", "exercises": [{"name": "Squat", "sets": 3, "reps": 10, "weight_kg": 55, "is_compound": true, "notes": ""}]},
 {"day_index": 1, "label": "Full Body B", "exercises": [{"name": "Deadlift", "sets": 3, "reps": 8, "weight_kg": 70, "is_compound": true, "notes": ""}]}]
```"#;

    #[tokio::test]
    async fn fenced_reply_is_parsed() {
        let generator = Scripted::ok(TWO_DAYS);
        let profile = profile();
        let days = generate_plan(&generator, &GenerationRequest::first_week(&profile))
            .await
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].exercises[0].name, "Deadlift");

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "exactly one model call");
        assert_eq!(seen[0].system, COACH_SYSTEM_PROMPT);
        assert!(seen[0].messages[0].content.contains("Generate a 2-day"));
    }

    #[tokio::test]
    async fn non_array_reply_is_malformed() {
        let generator = Scripted::ok(r#"{"plan": "three days of squats"}"#);
        let profile = profile();
        let err = generate_plan(&generator, &GenerationRequest::first_week(&profile))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Malformed(ContractError::NotAnArray("object"))
        ));
    }

    #[tokio::test]
    async fn missing_credential_is_surfaced() {
        let generator = Scripted {
            reply: Err(LlmError::MissingCredential("ANTHROPIC_API_KEY")),
            seen: Mutex::new(Vec::new()),
        };
        let profile = profile();
        let err = generate_plan(&generator, &GenerationRequest::first_week(&profile))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential("ANTHROPIC_API_KEY")));
        assert_eq!(
            err.to_string(),
            "ANTHROPIC_API_KEY environment variable is not set"
        );
    }

    #[test]
    fn transport_errors_map_to_model() {
        let err: GenerationError = LlmError::Api {
            status: 529,
            message: "Overloaded".into(),
        }
        .into();
        assert!(matches!(err, GenerationError::Model(_)));
    }
}
