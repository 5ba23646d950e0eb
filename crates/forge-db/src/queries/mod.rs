//! Query functions, one module per table family.

pub mod exercise_notes;
pub mod food_logs;
pub mod plans;
pub mod profiles;
pub mod users;
pub mod water_logs;
pub mod workout_logs;
