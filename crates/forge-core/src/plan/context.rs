//! Convert a persisted plan back into the contract shape, optionally
//! enriched with what the athlete actually did.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use forge_db::models::{Exercise, WorkoutLog};
use forge_db::queries::plans::PlanTree;

use super::contract::{DayPlan, ExercisePlan};

/// One day of a stored plan in contract shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayContext {
    pub day_index: i32,
    pub label: String,
    pub exercises: Vec<ExerciseContext>,
}

/// One exercise in contract shape. The `actual_*` keys are omitted entirely
/// when nothing was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseContext {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub is_compound: bool,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_reps: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight_kg: Option<f64>,
}

impl ExerciseContext {
    fn from_row(exercise: &Exercise, log: Option<&WorkoutLog>) -> Self {
        Self {
            name: exercise.name.clone(),
            sets: exercise.sets,
            reps: exercise.reps,
            weight_kg: exercise.weight_kg,
            is_compound: exercise.is_compound,
            notes: exercise.notes.clone(),
            actual_reps: log.map(|l| l.reps),
            actual_weight_kg: log.map(|l| l.weight_kg),
        }
    }

    /// The prescribed part only.
    pub fn prescription(&self) -> ExercisePlan {
        ExercisePlan {
            name: self.name.clone(),
            sets: self.sets,
            reps: self.reps,
            weight_kg: self.weight_kg,
            is_compound: self.is_compound,
            notes: self.notes.clone(),
        }
    }

    pub fn has_actuals(&self) -> bool {
        self.actual_reps.is_some() || self.actual_weight_kg.is_some()
    }

    /// Whether the logged set matched or beat the prescription. `None` when
    /// nothing was logged.
    pub fn met_prescription(&self) -> Option<bool> {
        let reps = self.actual_reps?;
        let weight = self.actual_weight_kg?;
        Some(reps >= self.reps && weight >= self.weight_kg)
    }
}

impl DayContext {
    pub fn prescription(&self) -> DayPlan {
        DayPlan {
            day_index: self.day_index,
            label: self.label.clone(),
            exercises: self.exercises.iter().map(ExerciseContext::prescription).collect(),
        }
    }
}

/// Build the contract view of `plan`. Logs are matched by exercise id; logs
/// for exercises outside the plan are ignored.
pub fn plan_context(plan: &PlanTree, logs: &[WorkoutLog]) -> Vec<DayContext> {
    let by_exercise: HashMap<Uuid, &WorkoutLog> =
        logs.iter().map(|log| (log.exercise_id, log)).collect();

    plan.days
        .iter()
        .map(|day| DayContext {
            day_index: day.day.day_index,
            label: day.day.label.clone(),
            exercises: day
                .exercises
                .iter()
                .map(|ex| ExerciseContext::from_row(ex, by_exercise.get(&ex.id).copied()))
                .collect(),
        })
        .collect()
}

/// Whether any exercise in the context carries logged actuals.
pub fn has_actuals(days: &[DayContext]) -> bool {
    days.iter()
        .flat_map(|d| d.exercises.iter())
        .any(ExerciseContext::has_actuals)
}
