//! Chat-driven plan editing.

pub mod editor;
pub mod sentinel;

pub use editor::{ChatError, ChatOutcome, ChatResponse, apply_chat, build_chat_system_prompt, chat};
pub use sentinel::{Extraction, PlanPayload, extract_plan_block};
