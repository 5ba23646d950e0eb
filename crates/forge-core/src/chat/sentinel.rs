//! Extraction of a tagged plan payload from a conversational reply.
//!
//! The assistant marks a replacement plan as
//! `<plan_json> ... </plan_json>`. Everything outside the tags is shown to
//! the user; the tagged content is parsed as the plan contract.

use crate::plan::contract::{ContractError, DayPlan, parse_plan_contract};

pub const OPEN_TAG: &str = "<plan_json>";
pub const CLOSE_TAG: &str = "</plan_json>";

/// What, if anything, the reply carried between the tags.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanPayload {
    /// No complete tagged block.
    Absent,
    /// A block that satisfies the contract.
    Valid(Vec<DayPlan>),
    /// A block that does not.
    Malformed(ContractError),
}

/// A reply split into the user-visible text and the embedded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub visible_reply: String,
    pub payload: PlanPayload,
}

/// Split `reply` on the first complete `<plan_json>` block.
///
/// An opening tag with no closing tag after it is treated as ordinary text:
/// the payload is [`PlanPayload::Absent`] and the reply is kept as is.
pub fn extract_plan_block(reply: &str) -> Extraction {
    let Some(open) = reply.find(OPEN_TAG) else {
        return absent(reply);
    };
    let inner_start = open + OPEN_TAG.len();
    let Some(close_rel) = reply[inner_start..].find(CLOSE_TAG) else {
        return absent(reply);
    };
    let inner_end = inner_start + close_rel;

    let before = reply[..open].trim();
    let after = reply[inner_end + CLOSE_TAG.len()..].trim();
    let visible_reply = [before, after]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let payload = match parse_plan_contract(&reply[inner_start..inner_end]) {
        Ok(days) => PlanPayload::Valid(days),
        Err(e) => PlanPayload::Malformed(e),
    };

    Extraction {
        visible_reply,
        payload,
    }
}

fn absent(reply: &str) -> Extraction {
    Extraction {
        visible_reply: reply.trim().to_owned(),
        payload: PlanPayload::Absent,
    }
}
