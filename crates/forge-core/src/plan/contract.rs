//! The structured plan contract.
//!
//! A week is a JSON array of day objects:
//!
//! ```json
//! [{"day_index": 0, "label": "Upper A", "exercises": [
//!     {"name": "Bench Press", "sets": 4, "reps": 6, "weight_kg": 80.0,
//!      "is_compound": true, "notes": ""}
//! ]}]
//! ```
//!
//! Model output is untrusted, so [`parse_plan_contract`] walks the JSON
//! value by hand and checks every field's presence and type before
//! coercing it into [`DayPlan`] / [`ExercisePlan`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest exercise name the store accepts.
pub const MAX_NAME_LEN: usize = 80;
/// Longest day label the store accepts.
pub const MAX_LABEL_LEN: usize = 50;
/// Notes beyond this many characters are cut off.
pub const MAX_NOTES_LEN: usize = 200;

/// One training day of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day_index: i32,
    pub label: String,
    pub exercises: Vec<ExercisePlan>,
}

/// One prescribed exercise of the contract. All six fields are always
/// present after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePlan {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub is_compound: bool,
    pub notes: String,
}

/// Ways a payload can violate the contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON array of days, got {0}")]
    NotAnArray(&'static str),

    #[error("plan must contain at least one day")]
    NoDays,

    #[error("{path}: expected an object, got {found}")]
    NotAnObject { path: String, found: &'static str },

    #[error("{path}: missing field {field:?}")]
    MissingField { path: String, field: &'static str },

    #[error("{path}.{field}: expected {expected}, got {found}")]
    WrongType {
        path: String,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}.{field}: {reason}")]
    InvalidValue {
        path: String,
        field: &'static str,
        reason: String,
    },

    #[error("duplicate day_index {0}")]
    DuplicateDayIndex(i32),

    #[error("day_index values must cover 0..{count} without gaps, found {found:?}")]
    NonContiguousDays { count: usize, found: Vec<i32> },
}

/// Remove a surrounding Markdown code fence (```` ``` ```` or
/// ```` ```json ````), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    s
}

/// Parse text (optionally fenced) into a validated list of days, ordered by
/// `day_index`.
pub fn parse_plan_contract(text: &str) -> Result<Vec<DayPlan>, ContractError> {
    let body = strip_code_fences(text);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ContractError::InvalidJson(e.to_string()))?;
    plan_from_value(&value)
}

/// Validate an already-parsed JSON value against the contract.
pub fn plan_from_value(value: &Value) -> Result<Vec<DayPlan>, ContractError> {
    let items = value
        .as_array()
        .ok_or_else(|| ContractError::NotAnArray(type_name(value)))?;
    if items.is_empty() {
        return Err(ContractError::NoDays);
    }

    let mut days = items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_day(item, &format!("[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for day in &days {
        if !seen.insert(day.day_index) {
            return Err(ContractError::DuplicateDayIndex(day.day_index));
        }
    }
    days.sort_by_key(|d| d.day_index);
    let contiguous = days
        .iter()
        .enumerate()
        .all(|(i, d)| d.day_index as usize == i);
    if !contiguous {
        return Err(ContractError::NonContiguousDays {
            count: days.len(),
            found: days.iter().map(|d| d.day_index).collect(),
        });
    }

    Ok(days)
}

fn parse_day(value: &Value, path: &str) -> Result<DayPlan, ContractError> {
    let obj = as_object(value, path)?;

    let day_index = require_int(obj, path, "day_index")?;
    if day_index < 0 {
        return Err(invalid(path, "day_index", "must be >= 0"));
    }
    let label = require_string(obj, path, "label")?;
    if label.trim().is_empty() {
        return Err(invalid(path, "label", "must not be empty"));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(invalid(
            path,
            "label",
            &format!("longer than {MAX_LABEL_LEN} characters"),
        ));
    }

    let raw_exercises = obj
        .get("exercises")
        .ok_or_else(|| missing(path, "exercises"))?;
    let list = raw_exercises.as_array().ok_or_else(|| ContractError::WrongType {
        path: path.to_owned(),
        field: "exercises",
        expected: "array",
        found: type_name(raw_exercises),
    })?;
    let exercises = list
        .iter()
        .enumerate()
        .map(|(i, ex)| parse_exercise(ex, &format!("{path}.exercises[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DayPlan {
        day_index,
        label: label.trim().to_owned(),
        exercises,
    })
}

fn parse_exercise(value: &Value, path: &str) -> Result<ExercisePlan, ContractError> {
    let obj = as_object(value, path)?;

    let name = require_string(obj, path, "name")?.trim().to_owned();
    if name.is_empty() {
        return Err(invalid(path, "name", "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(
            path,
            "name",
            &format!("longer than {MAX_NAME_LEN} characters"),
        ));
    }

    let sets = require_int(obj, path, "sets")?;
    if sets <= 0 {
        return Err(invalid(path, "sets", "must be > 0"));
    }
    let reps = require_int(obj, path, "reps")?;
    if reps <= 0 {
        return Err(invalid(path, "reps", "must be > 0"));
    }

    let weight_value = obj.get("weight_kg").ok_or_else(|| missing(path, "weight_kg"))?;
    let weight_kg = weight_value
        .as_f64()
        .ok_or_else(|| wrong_type(path, "weight_kg", "number", weight_value))?;
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(invalid(path, "weight_kg", "must be >= 0"));
    }

    let is_compound = match obj.get("is_compound") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(wrong_type(path, "is_compound", "bool", other)),
    };

    let notes = match obj.get("notes") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().chars().take(MAX_NOTES_LEN).collect(),
        Some(other) => return Err(wrong_type(path, "notes", "string", other)),
    };

    Ok(ExercisePlan {
        name,
        sets,
        reps,
        weight_kg,
        is_compound,
        notes,
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ContractError> {
    value.as_object().ok_or_else(|| ContractError::NotAnObject {
        path: path.to_owned(),
        found: type_name(value),
    })
}

fn require_string<'a>(
    obj: &'a Map<String, Value>,
    path: &str,
    field: &'static str,
) -> Result<&'a str, ContractError> {
    let value = obj.get(field).ok_or_else(|| missing(path, field))?;
    value
        .as_str()
        .ok_or_else(|| wrong_type(path, field, "string", value))
}

/// Integers may arrive as `8` or `8.0`; `8.5` and `"8"` are rejected.
fn require_int(
    obj: &Map<String, Value>,
    path: &str,
    field: &'static str,
) -> Result<i32, ContractError> {
    let value = obj.get(field).ok_or_else(|| missing(path, field))?;
    let n = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()) {
                f as i64
            } else {
                return Err(wrong_type(path, field, "integer", value));
            }
        }
        other => return Err(wrong_type(path, field, "integer", other)),
    };
    i32::try_from(n).map_err(|_| invalid(path, field, "out of range"))
}

fn missing(path: &str, field: &'static str) -> ContractError {
    ContractError::MissingField {
        path: path.to_owned(),
        field,
    }
}

fn wrong_type(path: &str, field: &'static str, expected: &'static str, found: &Value) -> ContractError {
    ContractError::WrongType {
        path: path.to_owned(),
        field,
        expected,
        found: type_name(found),
    }
}

fn invalid(path: &str, field: &'static str, reason: &str) -> ContractError {
    ContractError::InvalidValue {
        path: path.to_owned(),
        field,
        reason: reason.to_owned(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
      {"day_index": 1, "label": "Lower A", "exercises": [
        {"name": "Back Squat", "sets": 4, "reps": 5, "weight_kg": 112.5, "is_compound": true, "notes": "belt"}
      ]},
      {"day_index": 0, "label": "Upper A", "exercises": [
        {"name": "Bench Press", "sets": 4, "reps": 6, "weight_kg": 80, "is_compound": true, "notes": ""},
        {"name": "Lateral Raise", "sets": 3.0, "reps": 15, "weight_kg": 8.0}
      ]}
    ]"#;

    #[test]
    fn parses_and_orders_days() {
        let days = parse_plan_contract(VALID).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].label, "Upper A");
        assert_eq!(days[1].exercises[0].weight_kg, 112.5);

        let raise = &days[0].exercises[1];
        assert_eq!(raise.sets, 3);
        assert!(!raise.is_compound, "is_compound defaults to false");
        assert_eq!(raise.notes, "", "notes default to empty");
    }

    #[test]
    fn fenced_payload_is_accepted() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_plan_contract(&fenced).unwrap().len(), 2);
        let bare_fence = format!("```\n{VALID}```");
        assert_eq!(parse_plan_contract(&bare_fence).unwrap().len(), 2);
    }

    #[test]
    fn strip_code_fences_leaves_plain_text() {
        assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
    }

    #[test]
    fn top_level_object_is_rejected() {
        let err = parse_plan_contract(r#"{"days": []}"#).unwrap_err();
        assert_eq!(err, ContractError::NotAnArray("object"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = parse_plan_contract("Here is your plan: [").unwrap_err();
        assert!(matches!(err, ContractError::InvalidJson(_)));
    }

    #[test]
    fn empty_array_is_rejected() {
        assert_eq!(parse_plan_contract("[]").unwrap_err(), ContractError::NoDays);
    }

    #[test]
    fn missing_field_reports_path() {
        let err = parse_plan_contract(
            r#"[{"day_index": 0, "label": "A", "exercises": [{"name": "Row", "sets": 3, "weight_kg": 50}]}]"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[0].exercises[0]: missing field \"reps\""
        );
    }

    #[test]
    fn string_number_is_a_type_error() {
        let err = parse_plan_contract(
            r#"[{"day_index": 0, "label": "A", "exercises": [{"name": "Row", "sets": "3", "reps": 8, "weight_kg": 50}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ContractError::WrongType { field: "sets", expected: "integer", found: "string", .. }
        ));
    }

    #[test]
    fn fractional_reps_rejected() {
        let err = parse_plan_contract(
            r#"[{"day_index": 0, "label": "A", "exercises": [{"name": "Row", "sets": 3, "reps": 8.5, "weight_kg": 50}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::WrongType { field: "reps", .. }));
    }

    #[test]
    fn wrong_optional_type_rejected() {
        let err = parse_plan_contract(
            r#"[{"day_index": 0, "label": "A", "exercises": [{"name": "Row", "sets": 3, "reps": 8, "weight_kg": 50, "is_compound": "yes"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::WrongType { field: "is_compound", .. }));
    }

    #[test]
    fn zero_sets_and_negative_weight_rejected() {
        let zero_sets = r#"[{"day_index": 0, "label": "A", "exercises": [{"name": "Row", "sets": 0, "reps": 8, "weight_kg": 50}]}]"#;
        assert!(matches!(
            parse_plan_contract(zero_sets).unwrap_err(),
            ContractError::InvalidValue { field: "sets", .. }
        ));
        let negative = r#"[{"day_index": 0, "label": "A", "exercises": [{"name": "Row", "sets": 3, "reps": 8, "weight_kg": -5}]}]"#;
        assert!(matches!(
            parse_plan_contract(negative).unwrap_err(),
            ContractError::InvalidValue { field: "weight_kg", .. }
        ));
    }

    #[test]
    fn duplicate_and_gapped_indices_rejected() {
        let dup = r#"[{"day_index": 0, "label": "A", "exercises": []}, {"day_index": 0, "label": "B", "exercises": []}]"#;
        assert_eq!(
            parse_plan_contract(dup).unwrap_err(),
            ContractError::DuplicateDayIndex(0)
        );
        let gap = r#"[{"day_index": 1, "label": "A", "exercises": []}, {"day_index": 2, "label": "B", "exercises": []}]"#;
        assert!(matches!(
            parse_plan_contract(gap).unwrap_err(),
            ContractError::NonContiguousDays { count: 2, .. }
        ));
    }

    #[test]
    fn long_notes_are_truncated_long_names_rejected() {
        let notes = "x".repeat(300);
        let payload = format!(
            r#"[{{"day_index": 0, "label": "A", "exercises": [{{"name": "Row", "sets": 3, "reps": 8, "weight_kg": 50, "notes": "{notes}"}}]}}]"#
        );
        let days = parse_plan_contract(&payload).unwrap();
        assert_eq!(days[0].exercises[0].notes.len(), MAX_NOTES_LEN);

        let name = "y".repeat(81);
        let payload = format!(
            r#"[{{"day_index": 0, "label": "A", "exercises": [{{"name": "{name}", "sets": 3, "reps": 8, "weight_kg": 50}}]}}]"#
        );
        assert!(matches!(
            parse_plan_contract(&payload).unwrap_err(),
            ContractError::InvalidValue { field: "name", .. }
        ));
    }

    #[test]
    fn day_must_be_object() {
        let err = parse_plan_contract("[42]").unwrap_err();
        assert_eq!(
            err,
            ContractError::NotAnObject {
                path: "[0]".into(),
                found: "number"
            }
        );
    }
}
