use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Training goal chosen at onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Muscle,
    Strength,
    General,
}

impl Goal {
    /// Every goal, in display order.
    pub const ALL: [Goal; 3] = [Goal::Muscle, Goal::Strength, Goal::General];

    /// Human-readable description used in prompts.
    pub fn description(self) -> &'static str {
        match self {
            Self::Muscle => "Build Muscle (hypertrophy: moderate weight, higher reps)",
            Self::Strength => "Get Stronger (heavy weight, lower reps)",
            Self::General => "General Fitness (balanced approach)",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Muscle => "muscle",
            Self::Strength => "strength",
            Self::General => "general",
        };
        f.write_str(s)
    }
}

impl FromStr for Goal {
    type Err = GoalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "muscle" => Ok(Self::Muscle),
            "strength" => Ok(Self::Strength),
            "general" => Ok(Self::General),
            other => Err(GoalParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Goal`] string.
#[derive(Debug, Clone)]
pub struct GoalParseError(pub String);

impl fmt::Display for GoalParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid goal: {:?} (expected muscle, strength, or general)",
            self.0
        )
    }
}

impl std::error::Error for GoalParseError {}

// ---------------------------------------------------------------------------

/// Weekly split the generated plans follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    PushPullLegs,
    UpperLower,
    FullBody,
    MenstrualCycle,
    BroSplit,
}

impl PlanType {
    /// Every plan type, in display order.
    pub const ALL: [PlanType; 5] = [
        PlanType::PushPullLegs,
        PlanType::UpperLower,
        PlanType::FullBody,
        PlanType::MenstrualCycle,
        PlanType::BroSplit,
    ];

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::PushPullLegs => "Push / Pull / Legs",
            Self::UpperLower => "Upper / Lower",
            Self::FullBody => "Full Body",
            Self::MenstrualCycle => "Menstrual Cycle Adapted",
            Self::BroSplit => "Bro Split",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PushPullLegs => "push_pull_legs",
            Self::UpperLower => "upper_lower",
            Self::FullBody => "full_body",
            Self::MenstrualCycle => "menstrual_cycle",
            Self::BroSplit => "bro_split",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanType {
    type Err = PlanTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push_pull_legs" => Ok(Self::PushPullLegs),
            "upper_lower" => Ok(Self::UpperLower),
            "full_body" => Ok(Self::FullBody),
            "menstrual_cycle" => Ok(Self::MenstrualCycle),
            "bro_split" => Ok(Self::BroSplit),
            other => Err(PlanTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanType`] string.
#[derive(Debug, Clone)]
pub struct PlanTypeParseError(pub String);

impl fmt::Display for PlanTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan type: {:?}", self.0)
    }
}

impl std::error::Error for PlanTypeParseError {}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// An account. Authentication lives outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Body metrics, strength benchmarks, and the macro targets derived from
/// them. One per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal: Goal,
    pub plan_type: PlanType,
    pub days_per_week: i32,
    pub squat_1rm: f64,
    pub bench_1rm: f64,
    pub deadlift_1rm: f64,
    pub ohp_1rm: f64,
    pub calorie_target: i32,
    pub protein_target_g: i32,
    pub carbs_target_g: i32,
    pub fat_target_g: i32,
    pub updated_at: DateTime<Utc>,
}

/// A week of training for one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_number: i32,
    pub created_at: DateTime<Utc>,
}

/// One training day within a plan, ordered by `day_index`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutDay {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub day_index: i32,
    pub label: String,
}

/// A prescribed exercise, ordered within its day by `position`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub day_id: Uuid,
    pub position: i32,
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub is_compound: bool,
    pub notes: String,
}

/// The latest actual performance a user recorded for an exercise.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutLog {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub user_id: Uuid,
    pub reps: i32,
    pub weight_kg: f64,
    pub logged_at: DateTime<Utc>,
}

/// Free-text note a user keeps about an exercise, keyed by normalized name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_key: String,
    pub note: String,
    pub updated_at: DateTime<Utc>,
}

/// A food entry with macros already scaled to the serving size.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub serving_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub logged_at: DateTime<Utc>,
}

/// A single water intake entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaterLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_ml: i32,
    pub logged_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_display_roundtrip() {
        for v in &Goal::ALL {
            let s = v.to_string();
            let parsed: Goal = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn goal_invalid() {
        let err = "cardio".parse::<Goal>().unwrap_err();
        assert!(err.to_string().contains("cardio"));
    }

    #[test]
    fn plan_type_display_roundtrip() {
        for v in &PlanType::ALL {
            let s = v.to_string();
            let parsed: PlanType = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn plan_type_invalid() {
        assert!("ppl".parse::<PlanType>().is_err());
    }

    #[test]
    fn plan_type_serde_matches_display() {
        let json = serde_json::to_string(&PlanType::UpperLower).unwrap();
        assert_eq!(json, "\"upper_lower\"");
        let goal: Goal = serde_json::from_str("\"strength\"").unwrap();
        assert_eq!(goal, Goal::Strength);
    }
}
