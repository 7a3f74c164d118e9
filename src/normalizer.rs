//! Field normalization
//!
//! This module turns raw cell values into the comparable form every badge
//! predicate works on.
//! - Values trimmed and lower-cased
//! - Missing fields and empty cells collapse to `""`
//! - Non-string JSON values coerced to their string form

use crate::types::Row;
use serde_json::Value;

/// Closed set of valid multiple-choice responses
pub const VALID_RESPONSES: [&str; 5] = ["a", "b", "c", "d", "idk"];

/// Valid responses other than the correct answer `a`
pub const INCORRECT_RESPONSES: [&str; 4] = ["b", "c", "d", "idk"];

/// Normalizer for raw survey cell values
pub struct Normalizer;

impl Normalizer {
    /// Trim and case-fold a raw value; absent values normalize to `""`
    pub fn normalize(raw: Option<&str>) -> String {
        raw.map(|v| v.trim().to_lowercase()).unwrap_or_default()
    }

    /// Normalized value of a row field, `""` when the field is absent
    pub fn field(row: &Row, name: &str) -> String {
        Self::normalize(row.get(name))
    }

    /// Trimmed but case-preserving value of a row field
    pub fn trimmed(row: &Row, name: &str) -> String {
        row.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    /// Field is in the schema, non-null and non-blank after trimming
    pub fn is_present(row: &Row, name: &str) -> bool {
        row.has_field(name) && row.get(name).is_some_and(|v| !v.trim().is_empty())
    }

    /// Normalized field value is one of [`VALID_RESPONSES`]
    pub fn is_valid_response(row: &Row, name: &str) -> bool {
        VALID_RESPONSES.contains(&Self::field(row, name).as_str())
    }

    /// Normalized field value is one of [`INCORRECT_RESPONSES`]
    pub fn is_incorrect_response(row: &Row, name: &str) -> bool {
        INCORRECT_RESPONSES.contains(&Self::field(row, name).as_str())
    }

    /// Coerce a JSON value to a cell string; `null` becomes a missing value
    pub fn coerce(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }
}
