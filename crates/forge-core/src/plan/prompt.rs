//! Generation prompt construction.
//!
//! Pure and deterministic: the same request always renders the same text,
//! which keeps prompt changes reviewable in tests.

use std::fmt::Write;

use forge_db::models::{ExerciseNote, PlanType};

use super::context::{DayContext, has_actuals};
use crate::profile::ProfileSnapshot;

/// Everything the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub profile: &'a ProfileSnapshot,
    pub week_number: i32,
    /// Last week's plan, possibly with logged actuals.
    pub previous: Option<&'a [DayContext]>,
    pub notes: &'a [ExerciseNote],
}

impl<'a> GenerationRequest<'a> {
    /// A request with no history, as used at onboarding.
    pub fn first_week(profile: &'a ProfileSnapshot) -> Self {
        Self {
            profile,
            week_number: 1,
            previous: None,
            notes: &[],
        }
    }

    /// Whether the progressive-overload section applies.
    pub fn is_progression(&self) -> bool {
        self.previous.is_some() && self.week_number > 1
    }
}

/// Split-specific structuring rules.
pub fn plan_type_instructions(plan_type: PlanType) -> &'static str {
    match plan_type {
        PlanType::PushPullLegs => {
            "Structure the days as Push (chest, shoulders, triceps), Pull (back, biceps), and Legs. \
             For 4-5 days, repeat the split."
        }
        PlanType::UpperLower => "Alternate between Upper Body and Lower Body days.",
        PlanType::FullBody => {
            "Each day should hit all major muscle groups with compound movements."
        }
        PlanType::MenstrualCycle => {
            "Design a training plan that adapts to the menstrual cycle phases. \
             Week 1-2 (follicular phase): higher intensity and volume. \
             Week 3 (ovulation): moderate intensity. \
             Week 4 (luteal phase): lighter deload week with reduced volume. \
             For this specific week number, adjust intensity accordingly."
        }
        PlanType::BroSplit => {
            "Each day focuses on one muscle group: Chest, Back, Shoulders, Legs, Arms. \
             Adjust for the number of days available."
        }
    }
}

/// The output contract appended to every generation prompt.
pub const CONTRACT_EXAMPLE: &str = r#"[
  {
    "day_index": 0,
    "label": "Day Name",
    "exercises": [
      {"name": "Exercise Name", "sets": 4, "reps": 8, "weight_kg": 70.0, "is_compound": true, "notes": ""},
      {"name": "Exercise Name", "sets": 3, "reps": 12, "weight_kg": 20.0, "is_compound": false, "notes": ""}
    ]
  }
]"#;

/// Build the user prompt for one week of training.
pub fn build_generation_prompt(req: &GenerationRequest<'_>) -> String {
    let p = req.profile;
    let mut out = String::with_capacity(2048);

    let _ = writeln!(out, "Generate a {}-day weekly workout plan.", p.days_per_week);
    out.push('\n');
    out.push_str("User profile:\n");
    let _ = writeln!(out, "- Height: {}cm", p.height_cm);
    let _ = writeln!(out, "- Weight: {}kg", p.weight_kg);
    let _ = writeln!(out, "- Goal: {} [{}]", p.goal.description(), p.goal);
    let _ = writeln!(out, "- Plan type: {} [{}]", p.plan_type.label(), p.plan_type);
    let _ = writeln!(out, "- Days per week: {}", p.days_per_week);
    let _ = writeln!(
        out,
        "- 1RM - Squat: {}kg, Bench Press: {}kg, Deadlift: {}kg, Overhead Press: {}kg",
        p.squat_1rm, p.bench_1rm, p.deadlift_1rm, p.ohp_1rm
    );
    out.push('\n');
    let _ = writeln!(
        out,
        "Plan type instructions: {}",
        plan_type_instructions(p.plan_type)
    );
    out.push('\n');
    let _ = writeln!(out, "This is WEEK {}.", req.week_number);
    out.push('\n');
    out.push_str(
        "Requirements:\n\
         - Each day must include compound movements plus accessory/isolation work (5-8 exercises per day)\n\
         - Calculate working weights as percentages of the user's 1RM for compound lifts\n\
         - Round all weights to the nearest 2.5kg\n\
         - Include appropriate sets and reps for the user's goal\n\
         - Mark compound movements as is_compound: true\n",
    );

    if let Some(previous) = req.previous.filter(|_| req.is_progression()) {
        write_progression(&mut out, req.week_number, previous);
    }

    if !req.notes.is_empty() {
        out.push_str("\nAthlete notes (respect these when choosing exercises and loads):\n");
        for note in req.notes {
            let _ = writeln!(out, "- {}: {}", note.exercise_key, note.note);
        }
    }

    out.push_str(
        "\nReturn ONLY valid JSON, no markdown and no explanation. Use this exact format:\n",
    );
    out.push_str(CONTRACT_EXAMPLE);
    out
}

fn write_progression(out: &mut String, week_number: i32, previous: &[DayContext]) {
    // Serializing plain structs with string/number fields cannot fail.
    let last_week = serde_json::to_string_pretty(previous).unwrap_or_default();

    let _ = writeln!(
        out,
        "\nPROGRESSIVE OVERLOAD: this is week {week_number}. Here is last week's plan:"
    );
    out.push_str(&last_week);
    out.push('\n');
    out.push_str(
        "\nApply progressive overload:\n\
         - For compound lifts: increase weight by 2.5kg OR add 1 rep per set (alternate as appropriate)\n\
         - For accessories: add 1 rep or slightly increase weight\n\
         - Keep the same exercise structure and day labels\n",
    );

    if has_actuals(previous) {
        out.push_str(
            "\nSome exercises include actual_reps and actual_weight_kg: what the athlete really did last week.\n\
             - Only progress exercises where the actual performance met or beat the prescription\n\
             - Repeat the prescription, or reduce the weight by 2.5-5kg, where the athlete fell short\n\
             - Exercises without actuals were not logged; progress them normally\n",
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use forge_db::models::Goal;
    use uuid::Uuid;

    use super::*;
    use crate::plan::context::ExerciseContext;

    fn reference() -> ProfileSnapshot {
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

    fn last_week(with_actuals: bool) -> Vec<DayContext> {
        vec![DayContext {
            day_index: 0,
            label: "Upper A".into(),
            exercises: vec![ExerciseContext {
                name: "Bench Press".into(),
                sets: 4,
                reps: 6,
                weight_kg: 75.0,
                is_compound: true,
                notes: String::new(),
                actual_reps: with_actuals.then_some(6),
                actual_weight_kg: with_actuals.then_some(75.0),
            }],
        }]
    }

    #[test]
    fn reference_profile_week_one() {
        let profile = reference();
        let prompt = build_generation_prompt(&GenerationRequest::first_week(&profile));

        for fact in [
            "Generate a 4-day weekly workout plan.",
            "- Height: 180cm",
            "- Weight: 80kg",
            "[strength]",
            "Get Stronger (heavy weight, lower reps)",
            "[upper_lower]",
            "Upper / Lower",
            "Squat: 140kg",
            "Bench Press: 100kg",
            "Deadlift: 180kg",
            "Overhead Press: 60kg",
            "Alternate between Upper Body and Lower Body days.",
            "This is WEEK 1.",
            "5-8 exercises per day",
            "nearest 2.5kg",
            "is_compound: true",
            "\"day_index\": 0",
        ] {
            assert!(prompt.contains(fact), "prompt missing {fact:?}:\n{prompt}");
        }
        assert!(!prompt.contains("PROGRESSIVE OVERLOAD"));
        assert!(!prompt.contains("Athlete notes"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let profile = reference();
        let req = GenerationRequest::first_week(&profile);
        assert_eq!(build_generation_prompt(&req), build_generation_prompt(&req));
    }

    #[test]
    fn week_one_ignores_previous_plan() {
        let profile = reference();
        let prev = last_week(false);
        let req = GenerationRequest {
            profile: &profile,
            week_number: 1,
            previous: Some(&prev),
            notes: &[],
        };
        assert!(!build_generation_prompt(&req).contains("PROGRESSIVE OVERLOAD"));
    }

    #[test]
    fn later_week_embeds_last_week() {
        let profile = reference();
        let prev = last_week(false);
        let req = GenerationRequest {
            profile: &profile,
            week_number: 2,
            previous: Some(&prev),
            notes: &[],
        };
        let prompt = build_generation_prompt(&req);
        assert!(prompt.contains("PROGRESSIVE OVERLOAD: this is week 2."));
        assert!(prompt.contains("\"label\": \"Upper A\""));
        assert!(prompt.contains("increase weight by 2.5kg OR add 1 rep"));
        assert!(!prompt.contains("actual_reps"), "no actuals were logged");
    }

    #[test]
    fn actuals_add_performance_rules() {
        let profile = reference();
        let prev = last_week(true);
        let req = GenerationRequest {
            profile: &profile,
            week_number: 3,
            previous: Some(&prev),
            notes: &[],
        };
        let prompt = build_generation_prompt(&req);
        assert!(prompt.contains("\"actual_reps\": 6"));
        assert!(prompt.contains("Only progress exercises where the actual performance met"));
    }

    #[test]
    fn notes_section_lists_notes() {
        let profile = reference();
        let notes = vec![ExerciseNote {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            exercise_key: "barbell row".into(),
            note: "lower back tweak, keep it light".into(),
            updated_at: Utc::now(),
        }];
        let req = GenerationRequest {
            notes: &notes,
            ..GenerationRequest::first_week(&profile)
        };
        let prompt = build_generation_prompt(&req);
        assert!(prompt.contains("Athlete notes"));
        assert!(prompt.contains("- barbell row: lower back tweak, keep it light"));
    }

    #[test]
    fn every_plan_type_has_instructions() {
        for plan_type in PlanType::ALL {
            assert!(!plan_type_instructions(plan_type).is_empty());
        }
    }
}
