//! Metadata embedded in batch filenames
//!
//! Exports are named like `#90_SummerBreakCalculus2024-AT07 + trivia_July.csv`:
//! the leading `#90` orders problem sets, the segment after the first `-`
//! labels the problem, and `+ trivia` marks a trivia day.

use crate::error::BadgeError;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Problem identification taken from an export filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemInfo {
    /// e.g. `#90`
    pub number: String,
    /// e.g. `AT07 + trivia`
    pub label: String,
}

impl ProblemInfo {
    /// Split the base name on `-`; number and label are the first two
    /// segments, each cut at the first `_`
    pub fn from_file_name(file_name: &str) -> Result<Self, BadgeError> {
        let base = base_name(file_name);
        let mut parts = base.split('-');

        let number = parts.next().and_then(|p| p.split('_').next()).unwrap_or("");
        let label = parts
            .next()
            .and_then(|p| p.split('_').next())
            .ok_or_else(|| BadgeError::MalformedFilename(base.to_string()))?;

        Ok(Self {
            number: number.to_string(),
            label: label.to_string(),
        })
    }
}

/// Problem-set sequence number: the digits following the first `#`
pub fn sequence_number(file_name: &str) -> Option<u32> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"#(\d+)").expect("valid sequence pattern"));

    pattern
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether the export belongs to a trivia day
pub fn is_trivia_day(file_name: &str) -> bool {
    file_name.to_lowercase().contains("+ trivia")
}

fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_problem_info() {
        let info =
            ProblemInfo::from_file_name("exports/#90_SummerBreakCalculus2024-AT07 + trivia_July 1.csv")
                .unwrap();
        assert_eq!(info.number, "#90");
        assert_eq!(info.label, "AT07 + trivia");
    }

    #[test]
    fn test_problem_info_without_dash_is_malformed() {
        let err = ProblemInfo::from_file_name("#12_Calculus.csv").unwrap_err();
        assert!(matches!(err, BadgeError::MalformedFilename(name) if name == "#12_Calculus.csv"));
    }

    #[test]
    fn test_sequence_number() {
        assert_eq!(sequence_number("cleaned_#90_Summer-AT07.csv"), Some(90));
        assert_eq!(sequence_number("cleaned_#7-AT01.csv"), Some(7));
        assert_eq!(sequence_number("cleaned_Summer-AT07.csv"), None);
        assert_eq!(sequence_number("#99999999999-huge.csv"), None);
    }

    #[test]
    fn test_trivia_day() {
        assert!(is_trivia_day("#90_Summer-AT07 + Trivia_x.csv"));
        assert!(!is_trivia_day("#90_Summer-AT07_x.csv"));
    }
}
