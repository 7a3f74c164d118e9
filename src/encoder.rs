//! Output encoding
//!
//! This module serializes derived facts into the flat files downstream
//! tooling reads: per-batch badge listings (CSV and JSON), the cross-batch
//! badge totals, and the final streak table. JSON is written with 4-space
//! indentation.

use crate::error::BadgeError;
use crate::types::{AggregateCounts, AssignmentRecord, StreakRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const CLEANED_PREFIX: &str = "cleaned_";
const LISTING_PREFIX: &str = "Badges_cleaned_";

/// Paths written for one batch listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFiles {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Encoder for listing, totals and streak files
pub struct Encoder;

impl Encoder {
    /// Pretty JSON with 4-space indentation
    pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, BadgeError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn listing_json(records: &[AssignmentRecord]) -> Result<String, BadgeError> {
        Self::to_json(records)
    }

    pub fn listing_csv(records: &[AssignmentRecord]) -> Result<String, BadgeError> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            for record in records {
                writer.serialize(record)?;
            }
            if records.is_empty() {
                writer.write_record(["Student ID", "Badges"])?;
            }
            writer
                .flush()
                .map_err(|e| BadgeError::io("<listing csv>", e))?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn totals_json(counts: &AggregateCounts) -> Result<String, BadgeError> {
        Self::to_json(counts)
    }

    pub fn streaks_json(records: &[StreakRecord]) -> Result<String, BadgeError> {
        Self::to_json(records)
    }

    pub fn parse_listing_json(json: &str) -> Result<Vec<AssignmentRecord>, BadgeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn parse_listing_csv(csv_text: &str) -> Result<Vec<AssignmentRecord>, BadgeError> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn parse_totals_json(json: &str) -> Result<AggregateCounts, BadgeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn parse_streaks_json(json: &str) -> Result<Vec<StreakRecord>, BadgeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Listing file stem for a cleaned batch: `cleaned_` becomes
    /// `Badges_cleaned_` and the extension is dropped
    pub fn listing_stem(source_name: &str) -> String {
        let stem = Path::new(source_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_name.to_string());
        stem.replace(CLEANED_PREFIX, LISTING_PREFIX)
    }

    /// Write a batch listing as both CSV and JSON into `dir`
    pub fn write_listing(
        dir: &Path,
        source_name: &str,
        records: &[AssignmentRecord],
    ) -> Result<ListingFiles, BadgeError> {
        let stem = Self::listing_stem(source_name);
        let files = ListingFiles {
            csv: dir.join(format!("{stem}.csv")),
            json: dir.join(format!("{stem}.json")),
        };
        write_file(&files.csv, &Self::listing_csv(records)?)?;
        write_file(&files.json, &Self::listing_json(records)?)?;
        Ok(files)
    }

    pub fn write_totals(path: &Path, counts: &AggregateCounts) -> Result<(), BadgeError> {
        write_file(path, &Self::totals_json(counts)?)
    }

    pub fn write_streaks(path: &Path, records: &[StreakRecord]) -> Result<(), BadgeError> {
        write_file(path, &Self::streaks_json(records)?)
    }

    /// Read and deserialize a JSON file
    pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, BadgeError> {
        let content = fs::read_to_string(path).map_err(|e| BadgeError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), BadgeError> {
    fs::write(path, contents).map_err(|e| BadgeError::io(path, e))
}
