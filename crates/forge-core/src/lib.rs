//! Core logic for forge: plan generation and reconciliation, the
//! conversational plan editor, profile metrics, performance tracking, and
//! nutrition.

pub mod chat;
pub mod llm;
pub mod nutrition;
pub mod plan;
pub mod profile;
pub mod tracking;
