//! Plan management: the structured contract, prompt construction,
//! generation, the log-enriched context view, persistence, and markdown
//! materialization.

pub mod context;
pub mod contract;
pub mod generate;
pub mod materialize;
pub mod prompt;
pub mod service;

pub use context::{DayContext, ExerciseContext, plan_context};
pub use contract::{ContractError, DayPlan, ExercisePlan, parse_plan_contract, strip_code_fences};
pub use generate::{COACH_SYSTEM_PROMPT, GenerationError, generate_plan};
pub use materialize::{materialize_plan, render_plan_markdown};
pub use prompt::{GenerationRequest, build_generation_prompt};
pub use service::{
    PlanServiceError, ProfileAndPlan, current_context, current_plan, generate_first_week,
    generate_next_week, onboard, regenerate_from_profile, replace_plan_days, save_plan,
};
