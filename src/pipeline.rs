//! Pipeline orchestration
//!
//! This module provides the public API for badgeboard. It sequences the
//! folder-level stages (clean → badges → totals → streaks) and offers an
//! in-memory processor for callers that already hold loaded batches.

use crate::aggregate::{self, BadgeAggregator};
use crate::badges::BadgeEngine;
use crate::cleaning::{Cleaner, STATUS_COLUMN};
use crate::config::PipelineConfig;
use crate::encoder::Encoder;
use crate::error::BadgeError;
use crate::schema::{is_trivia_day, sequence_number, Batch};
use crate::streak::StreakTracker;
use crate::types::{AggregateCounts, AssignmentRecord, StreakRecord};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one folder-level stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Output files written
    pub written: Vec<PathBuf>,
    /// Input files skipped, with the reason
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file: PathBuf,
    pub reason: String,
}

impl StageReport {
    fn skip(&mut self, file: &Path, reason: impl ToString) {
        let reason = reason.to_string();
        warn!(file = %file.display(), %reason, "skipping file");
        self.skipped.push(SkippedFile {
            file: file.to_path_buf(),
            reason,
        });
    }
}

/// Outcome of a full run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub clean: StageReport,
    pub badges: StageReport,
    pub totals: StageReport,
    pub streaks: StageReport,
}

/// Clean every raw export in `config.raw_dir` into `config.cleaned_dir`
pub fn clean_folder(config: &PipelineConfig) -> Result<StageReport, BadgeError> {
    let inputs = list_files(&config.raw_dir, "csv")?;
    create_dir(&config.cleaned_dir)?;

    let cleaner = Cleaner::new(config.identifying_columns.clone());
    let mut report = StageReport::default();

    for path in inputs {
        let raw = match Batch::probe_path(&path, STATUS_COLUMN, config.header_probe_rows) {
            Ok(batch) => batch,
            Err(e) => {
                report.skip(&path, e);
                continue;
            }
        };
        let file_name = raw.name().to_string();
        let cleaned = match cleaner.clean(raw) {
            Ok(batch) => batch,
            Err(e) => {
                report.skip(&path, e);
                continue;
            }
        };

        let output = config.cleaned_dir.join(format!("cleaned_{file_name}"));
        cleaned.write_csv(&output)?;
        info!(input = %path.display(), output = %output.display(), rows = cleaned.len(), "cleaned batch");
        if is_trivia_day(&file_name) {
            info!(file = %file_name, "marked as a trivia day");
        }
        report.written.push(output);
    }

    Ok(report)
}

/// Evaluate badges for one batch and project the filtered listing
pub fn badge_listing(batch: &Batch) -> Vec<AssignmentRecord> {
    let assignments = BadgeEngine::assign_all(batch.rows());
    aggregate::listing(&assignments)
}

/// Write a badge listing (CSV + JSON) for every cleaned batch
pub fn badge_folder(cleaned_dir: &Path, badges_dir: &Path) -> Result<StageReport, BadgeError> {
    let inputs = list_files(cleaned_dir, "csv")?;
    create_dir(badges_dir)?;

    let mut report = StageReport::default();
    for path in inputs {
        let batch = match Batch::from_path(&path) {
            Ok(batch) => batch,
            Err(e) => {
                report.skip(&path, e);
                continue;
            }
        };

        let records = badge_listing(&batch);
        let files = Encoder::write_listing(badges_dir, batch.name(), &records)?;
        info!(
            input = %path.display(),
            csv = %files.csv.display(),
            json = %files.json.display(),
            listed = records.len(),
            "wrote badge listing"
        );
        report.written.push(files.csv);
        report.written.push(files.json);
    }

    Ok(report)
}

/// Total badge counts over every JSON listing in `badges_dir`
pub fn count_folder(badges_dir: &Path) -> Result<(AggregateCounts, StageReport), BadgeError> {
    let inputs = list_files(badges_dir, "json")?;

    let mut aggregator = BadgeAggregator::new();
    let mut report = StageReport::default();
    for path in inputs {
        match Encoder::read_json::<Vec<AssignmentRecord>>(&path) {
            Ok(records) => records.iter().for_each(|r| aggregator.add_record(r)),
            Err(e) => report.skip(&path, e),
        }
    }

    let counts = aggregator.finish();
    info!(
        participants = counts.by_participant.len(),
        labels = counts.overall.len(),
        "aggregated badge totals"
    );
    Ok((counts, report))
}

/// Final streaks over every cleaned batch, walked in problem-number order
pub fn streak_folder(cleaned_dir: &Path) -> Result<(Vec<StreakRecord>, StageReport), BadgeError> {
    let mut report = StageReport::default();
    let mut numbered = Vec::new();
    for path in list_files(cleaned_dir, "csv")? {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match sequence_number(&file_name) {
            Some(sequence) => numbered.push((sequence, path)),
            None => report.skip(&path, "no '#<number>' problem number in filename"),
        }
    }
    numbered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut tracker = StreakTracker::new();
    for (sequence, path) in numbered {
        let batch = match Batch::from_path(&path) {
            Ok(batch) => batch,
            Err(e) => {
                report.skip(&path, e);
                continue;
            }
        };
        if !tracker.observe_batch(sequence, &batch)? {
            report.skip(&path, "missing 'RecordedDate' or 'ExternalReference' column");
        }
    }

    let records = tracker.finish();
    info!(participants = records.len(), "computed streaks");
    Ok((records, report))
}

/// Run every stage in order using the configured layout
pub fn run_all(config: &PipelineConfig) -> Result<RunReport, BadgeError> {
    config.validate()?;

    let clean = clean_folder(config)?;
    let badges = badge_folder(&config.cleaned_dir, &config.badges_dir)?;

    let (counts, mut totals) = count_folder(&config.badges_dir)?;
    Encoder::write_totals(&config.totals_path, &counts)?;
    totals.written.push(config.totals_path.clone());

    let (records, mut streaks) = streak_folder(&config.cleaned_dir)?;
    Encoder::write_streaks(&config.streak_path, &records)?;
    streaks.written.push(config.streak_path.clone());

    Ok(RunReport {
        clean,
        badges,
        totals,
        streaks,
    })
}

/// Stateful processor for batches already held in memory.
///
/// Folds each batch's filtered listing into running totals and, for batches
/// whose name carries a problem number, advances the streak tracker. Batches
/// must be supplied in ascending problem-number order, or passed together
/// through [`BadgeProcessor::process_all`], which sorts them first.
#[derive(Debug, Clone, Default)]
pub struct BadgeProcessor {
    aggregator: BadgeAggregator,
    tracker: StreakTracker,
}

impl BadgeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from previously saved streak state
    pub fn with_streak_state(json: &str) -> Result<Self, BadgeError> {
        Ok(Self {
            aggregator: BadgeAggregator::new(),
            tracker: StreakTracker::from_json(json)?,
        })
    }

    /// Process one batch and return its filtered listing
    pub fn process(&mut self, batch: &Batch) -> Result<Vec<AssignmentRecord>, BadgeError> {
        // A rejected batch must leave the totals untouched
        match sequence_number(batch.name()) {
            Some(sequence) => {
                if !self.tracker.observe_batch(sequence, batch)? {
                    warn!(batch = batch.name(), "batch lacks streak columns, not tracked");
                }
            }
            None => warn!(batch = batch.name(), "no problem number, not tracked"),
        }

        let records = badge_listing(batch);
        records.iter().for_each(|r| self.aggregator.add_record(r));
        Ok(records)
    }

    /// Sort batches by problem number, then process them in order
    pub fn process_all(&mut self, mut batches: Vec<Batch>) -> Result<Vec<Vec<AssignmentRecord>>, BadgeError> {
        batches.sort_by_key(|b| sequence_number(b.name()));
        batches.iter().map(|b| self.process(b)).collect()
    }

    pub fn totals(&self) -> &AggregateCounts {
        self.aggregator.counts()
    }

    /// Save streak state to JSON
    pub fn save_streak_state(&self) -> Result<String, BadgeError> {
        Ok(self.tracker.to_json()?)
    }

    /// Finalize totals and streaks
    pub fn finish(self) -> (AggregateCounts, Vec<StreakRecord>) {
        (self.aggregator.finish(), self.tracker.finish())
    }
}

/// Files in `dir` with the given extension, sorted by name
fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, BadgeError> {
    if !dir.is_dir() {
        return Err(BadgeError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|e| BadgeError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BadgeError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn create_dir(dir: &Path) -> Result<(), BadgeError> {
    fs::create_dir_all(dir).map_err(|e| BadgeError::io(dir, e))
}
