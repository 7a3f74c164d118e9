//! Raw export cleaning
//!
//! Turns a raw survey export into a cleaned batch:
//! - Preview responses removed
//! - Identifying and administrative columns stripped
//! - Problem number and label appended from the filename
//! - `RecordedDate` reduced to a calendar date

use crate::error::BadgeError;
use crate::schema::{Batch, ProblemInfo};
use crate::types::RECORDED_DATE_COLUMN;
use chrono::{NaiveDate, NaiveDateTime};

pub const STATUS_COLUMN: &str = "Status";
pub const DISTRIBUTION_CHANNEL_COLUMN: &str = "DistributionChannel";
pub const PROBLEM_NUMBER_COLUMN: &str = "Problem Number";
pub const PROBLEM_LABEL_COLUMN: &str = "Problem Label";

/// Columns removed from every cleaned batch
pub const IDENTIFYING_COLUMNS: [&str; 18] = [
    "LocationLatitude",
    "LocationLongitude",
    "RecipientLastName",
    "RecipientFirstName",
    "RecipientEmail",
    "IPAddress",
    "UserLanguage",
    "Status",
    "Progress",
    "DistributionChannel",
    "Duration (in seconds)",
    "Finished",
    "ResponseId",
    "L2 confidence",
    "Rethink L2",
    "L1 confidence",
    "L1S confidence",
    "L2 conf after L1",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Cleaner for raw survey exports
pub struct Cleaner {
    identifying_columns: Vec<String>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(IDENTIFYING_COLUMNS.iter().map(|c| c.to_string()).collect())
    }
}

impl Cleaner {
    pub fn new(identifying_columns: Vec<String>) -> Self {
        Self { identifying_columns }
    }

    /// Clean a raw batch named after its source file
    pub fn clean(&self, mut batch: Batch) -> Result<Batch, BadgeError> {
        let info = ProblemInfo::from_file_name(batch.name())?;

        batch.retain_rows(|row| {
            row.get(STATUS_COLUMN) != Some("Survey Preview")
                && row.get(DISTRIBUTION_CHANNEL_COLUMN) != Some("preview")
        });
        batch.drop_columns(&self.identifying_columns);
        batch.set_constant_column(PROBLEM_NUMBER_COLUMN, &info.number);
        batch.set_constant_column(PROBLEM_LABEL_COLUMN, &info.label);
        batch.map_column(RECORDED_DATE_COLUMN, |value| {
            value
                .and_then(parse_recorded_date)
                .map(|date| date.format("%Y-%m-%d").to_string())
        });

        Ok(batch)
    }
}

/// Parse a recorded timestamp down to its date; `None` when unparseable
pub fn parse_recorded_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_batch() -> Batch {
        Batch::from_rows(
            "#90_SummerBreakCalculus2024-AT07 + trivia_July.csv",
            &[
                "Status",
                "IPAddress",
                "DistributionChannel",
                "RecordedDate",
                "ExternalReference",
                "L1 problem",
            ],
            vec![
                vec!["Response Type", "IP Address", "Distribution Channel", "Recorded Date", "External Data Reference", "L1"],
                vec!["IP Address", "10.0.0.1", "anonymous", "2024-07-01 09:15:00", "S1", "a"],
                vec!["Survey Preview", "10.0.0.2", "anonymous", "2024-07-01 09:20:00", "S2", "b"],
                vec!["IP Address", "10.0.0.3", "preview", "2024-07-01 09:25:00", "S3", "c"],
            ],
        )
    }

    #[test]
    fn test_clean_drops_previews_and_identifying_columns() {
        let cleaned = Cleaner::default().clean(raw_batch()).unwrap();

        assert_eq!(
            cleaned.headers(),
            &["RecordedDate", "ExternalReference", "L1 problem", "Problem Number", "Problem Label"]
        );
        let ids: Vec<_> = cleaned
            .rows()
            .iter()
            .filter_map(|r| r.get("ExternalReference"))
            .collect();
        assert_eq!(ids, vec!["External Data Reference", "S1"]);
    }

    #[test]
    fn test_clean_adds_problem_info_and_coerces_dates() {
        let cleaned = Cleaner::default().clean(raw_batch()).unwrap();
        let header_leak = &cleaned.rows()[0];
        let response = &cleaned.rows()[1];

        assert_eq!(response.get("Problem Number"), Some("#90"));
        assert_eq!(response.get("Problem Label"), Some("AT07 + trivia"));
        assert_eq!(response.get("RecordedDate"), Some("2024-07-01"));
        assert!(header_leak.has_field("RecordedDate"));
        assert_eq!(header_leak.get("RecordedDate"), None);
    }

    #[test]
    fn test_clean_rejects_malformed_name() {
        let batch = Batch::from_rows("survey.csv", &["Status"], vec![]);
        assert!(matches!(
            Cleaner::default().clean(batch),
            Err(BadgeError::MalformedFilename(_))
        ));
    }

    #[test]
    fn test_custom_identifying_columns() {
        let cleaner = Cleaner::new(vec!["L1 problem".to_string()]);
        let cleaned = cleaner.clean(raw_batch()).unwrap();

        assert!(cleaned.has_column("Status"));
        assert!(!cleaned.has_column("L1 problem"));
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_parse_recorded_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 1);
        assert_eq!(parse_recorded_date("2024-07-01 09:15:00"), expected);
        assert_eq!(parse_recorded_date("7/1/2024 9:15"), expected);
        assert_eq!(parse_recorded_date("2024-07-01"), expected);
        assert_eq!(parse_recorded_date("Recorded Date"), None);
    }
}
