//! Shared fixtures for forge-core integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use forge_core::llm::{API_KEY_ENV, CompletionRequest, LlmError, TextGenerator};
use forge_core::profile::ProfileSnapshot;
use forge_db::models::{Goal, PlanType};

/// Replays canned replies in order and records every request it receives.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_owned())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like the real client with no API key configured.
    pub fn without_credentials() -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(LlmError::MissingCredential(API_KEY_ENV))])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.messages[0].content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub fn reference_profile() -> ProfileSnapshot {
    ProfileSnapshot {
        height_cm: 180.0,
        weight_kg: 80.0,
        goal: Goal::Strength,
        plan_type: PlanType::UpperLower,
        days_per_week: 4,
        squat_1rm: 140.0,
        bench_1rm: 100.0,
        deadlift_1rm: 180.0,
        ohp_1rm: 60.0,
    }
}

pub const WEEK_ONE: &str = r#"[
  {"day_index": 0, "label": "Upper A", "exercises": [
    {"name": "Bench Press", "sets": 4, "reps": 5, "weight_kg": 80.0, "is_compound": true, "notes": "2 min rest"},
    {"name": "Barbell Row", "sets": 4, "reps": 6, "weight_kg": 70.0, "is_compound": true, "notes": ""},
    {"name": "Lateral Raise", "sets": 3, "reps": 15, "weight_kg": 8.0, "is_compound": false, "notes": ""}
  ]},
  {"day_index": 1, "label": "Lower A", "exercises": [
    {"name": "Back Squat", "sets": 5, "reps": 5, "weight_kg": 112.5, "is_compound": true, "notes": ""},
    {"name": "Leg Curl", "sets": 3, "reps": 12, "weight_kg": 35.0, "is_compound": false, "notes": ""}
  ]}
]"#;

pub const WEEK_TWO: &str = r#"```json
[
  {"day_index": 0, "label": "Upper A", "exercises": [
    {"name": "Bench Press", "sets": 4, "reps": 5, "weight_kg": 82.5, "is_compound": true, "notes": ""}
  ]},
  {"day_index": 1, "label": "Lower A", "exercises": [
    {"name": "Back Squat", "sets": 5, "reps": 5, "weight_kg": 115.0, "is_compound": true, "notes": ""}
  ]}
]
```"#;
