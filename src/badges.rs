//! Badge rule engine
//!
//! Each rule is an independent predicate over one normalized row. A row may
//! satisfy any number of rules; the engine returns the union of their labels
//! in a fixed order:
//! - Exertion: both main problems answered
//! - Endurance: main and simulated problem answered, per level
//! - Initiative: started at L2 and answered it
//! - Determination: kept going after a wrong answer
//! - Commitment: flashcard answers given (one star each)
//! - Community: took part in trivia day

use crate::normalizer::Normalizer;
use crate::types::{BadgeAssignment, BadgeLabel, EnduranceStars, Row};

pub const L1_PROBLEM: &str = "L1 problem";
pub const L2_PROBLEM: &str = "L2 problem";
pub const L1_SIMULATED: &str = "l1sim problem";
pub const L2_SIMULATED: &str = "L2S answer";
pub const L1_AFTER_HINT: &str = "L1 answer after hint";
pub const L2_AFTER_HINT: &str = "L2 after hint answer";
pub const STARTING_LEVEL: &str = "Starting level";
pub const TRIVIA_DAY: &str = "Trivia Day";

/// Flashcard answer columns counted by the Commitment badge
pub const FLASHCARD_FIELDS: [&str; 4] = [
    "L1x1q answer",
    "L1x2q answer",
    "L2x1q answer",
    "L2x2q answer",
];

const L2_START: &str = "L2 Start";
const TRIVIA_RESPONSES: [&str; 2] = ["calc plus trivia", "just trivia"];

/// Stateless evaluator for the fixed badge rule set
pub struct BadgeEngine;

impl BadgeEngine {
    /// Evaluate every rule against a row and collect the earned labels
    pub fn evaluate(row: &Row) -> Vec<BadgeLabel> {
        [
            exertion(row),
            endurance(row),
            initiative(row),
            determination(row),
            commitment(row),
            community(row),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Evaluate a row and attach its participant identifier
    pub fn assign(row: &Row) -> BadgeAssignment {
        BadgeAssignment {
            participant: row.participant(),
            labels: Self::evaluate(row),
        }
    }

    /// Evaluate every row of a batch in order
    pub fn assign_all<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<BadgeAssignment> {
        rows.into_iter().map(Self::assign).collect()
    }
}

fn exertion(row: &Row) -> Option<BadgeLabel> {
    (Normalizer::is_valid_response(row, L1_PROBLEM)
        && Normalizer::is_valid_response(row, L2_PROBLEM))
    .then_some(BadgeLabel::Exertion)
}

fn endurance(row: &Row) -> Option<BadgeLabel> {
    let left = Normalizer::is_valid_response(row, L1_PROBLEM)
        && Normalizer::is_valid_response(row, L1_SIMULATED);
    let right = Normalizer::is_valid_response(row, L2_PROBLEM)
        && Normalizer::is_valid_response(row, L2_SIMULATED);

    match (left, right) {
        (true, true) => Some(BadgeLabel::Endurance(EnduranceStars::Both)),
        (true, false) => Some(BadgeLabel::Endurance(EnduranceStars::Left)),
        (false, true) => Some(BadgeLabel::Endurance(EnduranceStars::Right)),
        (false, false) => None,
    }
}

fn initiative(row: &Row) -> Option<BadgeLabel> {
    (Normalizer::trimmed(row, STARTING_LEVEL) == L2_START
        && Normalizer::is_valid_response(row, L2_PROBLEM))
    .then_some(BadgeLabel::Initiative)
}

fn determination(row: &Row) -> Option<BadgeLabel> {
    let retried = |first: &str, follow_up: &str| {
        Normalizer::is_incorrect_response(row, first)
            && Normalizer::is_valid_response(row, follow_up)
    };

    (retried(L1_PROBLEM, L1_AFTER_HINT)
        || retried(L1_PROBLEM, L1_SIMULATED)
        || retried(L2_PROBLEM, L2_AFTER_HINT)
        || retried(L2_PROBLEM, L2_SIMULATED))
    .then_some(BadgeLabel::Determination)
}

fn commitment(row: &Row) -> Option<BadgeLabel> {
    let stars = FLASHCARD_FIELDS
        .iter()
        .filter(|field| Normalizer::is_present(row, field))
        .count() as u8;

    (stars >= 1).then_some(BadgeLabel::Commitment(stars))
}

fn community(row: &Row) -> Option<BadgeLabel> {
    if !row.has_field(TRIVIA_DAY) {
        return None;
    }
    let entry = Normalizer::field(row, TRIVIA_DAY);
    TRIVIA_RESPONSES
        .contains(&entry.as_str())
        .then_some(BadgeLabel::Community)
}
