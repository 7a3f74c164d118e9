//! Core types for the badgeboard pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: survey rows, participant identifiers, badge labels, per-row
//! assignments, aggregate counts and streak records.

use crate::error::BadgeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One participant's responses to one problem set.
///
/// Every column of the batch schema is a key, so schema membership is
/// observable even when the cell itself is empty (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, Option<String>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful in tests
    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.insert(field, Some(value.to_string()));
        self
    }

    /// Insert a field; empty strings are stored as missing values
    pub fn insert(&mut self, field: &str, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        self.fields.insert(field.to_string(), value);
    }

    /// Build a row from a header list and one CSV record.
    ///
    /// Cells spelled as one of [`NULL_TOKENS`] load as missing values.
    pub fn from_record(headers: &[String], record: &csv::StringRecord) -> Self {
        let mut row = Row::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = record.get(idx).filter(|cell| !NULL_TOKENS.contains(cell));
            row.insert(header, value.map(str::to_string));
        }
        row
    }

    /// Build a row from a JSON object, coercing scalar values to strings
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut row = Row::new();
        for (field, value) in object {
            row.insert(field, crate::normalizer::Normalizer::coerce(value));
        }
        row
    }

    /// Raw cell value; `None` when the field is absent or empty
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    /// Whether the field is part of this row's schema, regardless of its value
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Option<String>> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Participant identifier taken from the `ExternalReference` column
    pub fn participant(&self) -> ParticipantId {
        self.get(PARTICIPANT_COLUMN)
            .map(ParticipantId::from)
            .unwrap_or_else(ParticipantId::unknown)
    }
}

/// Cell spellings read as missing data in CSV input (exact match, case-sensitive)
pub const NULL_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Column holding the participant identifier
pub const PARTICIPANT_COLUMN: &str = "ExternalReference";

/// Column holding the response timestamp
pub const RECORDED_DATE_COLUMN: &str = "RecordedDate";

/// Opaque, stable participant identifier used as the join key across batches
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Placeholder for rows with no identifier
    pub const UNKNOWN: &'static str = "Unknown";

    /// Question-text header row that leaks into survey exports as a data row
    pub const HEADER_LEAK: &'static str = "External Data Reference";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_header_leak(&self) -> bool {
        self.0 == Self::HEADER_LEAK
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which half of the Endurance badge was earned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnduranceStars {
    Both,
    Left,
    Right,
}

/// A badge earned by a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BadgeLabel {
    Exertion,
    Endurance(EnduranceStars),
    Initiative,
    Determination,
    /// Number of flashcard answers given (1..=4)
    Commitment(u8),
    Community,
}

impl fmt::Display for BadgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadgeLabel::Exertion => f.write_str("Exertion"),
            BadgeLabel::Endurance(EnduranceStars::Both) => f.write_str("Endurance (both stars)"),
            BadgeLabel::Endurance(EnduranceStars::Left) => {
                f.write_str("Endurance (one star - left)")
            }
            BadgeLabel::Endurance(EnduranceStars::Right) => {
                f.write_str("Endurance (one star - right)")
            }
            BadgeLabel::Initiative => f.write_str("Initiative"),
            BadgeLabel::Determination => f.write_str("Determination"),
            BadgeLabel::Commitment(stars) => {
                let plural = if *stars > 1 { "s" } else { "" };
                write!(f, "Commitment badge ({stars} star{plural})")
            }
            BadgeLabel::Community => f.write_str("Community"),
        }
    }
}

impl FromStr for BadgeLabel {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = match s.trim() {
            "Exertion" => BadgeLabel::Exertion,
            "Endurance (both stars)" => BadgeLabel::Endurance(EnduranceStars::Both),
            "Endurance (one star - left)" => BadgeLabel::Endurance(EnduranceStars::Left),
            "Endurance (one star - right)" => BadgeLabel::Endurance(EnduranceStars::Right),
            "Initiative" => BadgeLabel::Initiative,
            "Determination" => BadgeLabel::Determination,
            "Community" => BadgeLabel::Community,
            other => {
                let stars = other
                    .strip_prefix("Commitment badge (")
                    .and_then(|rest| {
                        rest.strip_suffix(" stars)")
                            .or_else(|| rest.strip_suffix(" star)"))
                    })
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| *n >= 1);
                match stars {
                    Some(n) => BadgeLabel::Commitment(n),
                    None => return Err(BadgeError::UnknownLabel(other.to_string())),
                }
            }
        };
        Ok(label)
    }
}

/// Badges earned by one participant in one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeAssignment {
    pub participant: ParticipantId,
    pub labels: Vec<BadgeLabel>,
}

impl BadgeAssignment {
    /// Labels as they appear in the flat listing
    pub fn joined_labels(&self) -> String {
        self.labels
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_record(&self) -> AssignmentRecord {
        AssignmentRecord {
            student_id: self.participant.clone(),
            badges: self.joined_labels(),
        }
    }
}

/// Serialized form of a [`BadgeAssignment`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "Student ID")]
    pub student_id: ParticipantId,
    #[serde(rename = "Badges", default)]
    pub badges: String,
}

impl AssignmentRecord {
    /// Individual label strings, trimmed, empty entries skipped
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.badges.split(',').map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Per-participant and global badge tallies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    #[serde(rename = "BadgeCountsByStudent")]
    pub by_participant: BTreeMap<ParticipantId, BTreeMap<String, u64>>,
    #[serde(rename = "OverallBadgeCounts")]
    pub overall: BTreeMap<String, u64>,
}

impl AggregateCounts {
    pub fn participant_count(&self, participant: &ParticipantId, label: &str) -> u64 {
        self.by_participant
            .get(participant)
            .and_then(|labels| labels.get(label))
            .copied()
            .unwrap_or(0)
    }

    pub fn overall_count(&self, label: &str) -> u64 {
        self.overall.get(label).copied().unwrap_or(0)
    }
}

/// Final streak length for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    #[serde(rename = "Student ID")]
    pub student_id: ParticipantId,
    #[serde(rename = "Current Streak")]
    pub current_streak: u32,
}
