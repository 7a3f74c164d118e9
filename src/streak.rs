//! Streak continuity tracking
//!
//! Walks problem-set batches in ascending sequence order and keeps, per
//! participant, the number of consecutive batches they appeared in. Streaks
//! reset to zero on absence, and for everyone on a gap in the sequence.

use crate::error::BadgeError;
use crate::schema::Batch;
use crate::types::{ParticipantId, StreakRecord, PARTICIPANT_COLUMN, RECORDED_DATE_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Streak state for one run over a sorted sequence of batches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTracker {
    streaks: BTreeMap<ParticipantId, u32>,
    previous_sequence: Option<u32>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one batch's attendance.
    ///
    /// A sequence number lower than the last processed batch is rejected;
    /// anything other than `previous + 1` resets every tracked streak before
    /// presence is applied.
    pub fn observe(
        &mut self,
        sequence: u32,
        present: &BTreeSet<ParticipantId>,
    ) -> Result<(), BadgeError> {
        if let Some(previous) = self.previous_sequence {
            if sequence < previous {
                return Err(BadgeError::OutOfOrderBatch {
                    previous,
                    current: sequence,
                });
            }
            if previous.checked_add(1) != Some(sequence) {
                debug!(previous, sequence, "sequence gap, resetting all streaks");
                self.streaks.values_mut().for_each(|streak| *streak = 0);
            }
        }

        for (participant, streak) in self.streaks.iter_mut() {
            if present.contains(participant) {
                *streak += 1;
            } else {
                *streak = 0;
            }
        }

        for participant in present {
            self.streaks.entry(participant.clone()).or_insert(1);
        }

        debug!(sequence, present = present.len(), tracked = self.streaks.len(), "batch applied");
        self.previous_sequence = Some(sequence);
        Ok(())
    }

    /// Apply a loaded batch, skipping it when it lacks the identifier or
    /// timestamp column. Returns whether the batch was applied.
    ///
    /// A skipped batch does not become the "previous" batch, so the next
    /// applied batch is gap-checked against the last one actually applied.
    pub fn observe_batch(&mut self, sequence: u32, batch: &Batch) -> Result<bool, BadgeError> {
        match participant_set(batch) {
            Some(present) => {
                self.observe(sequence, &present)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Current streak for a participant, if tracked
    pub fn streak(&self, participant: &ParticipantId) -> Option<u32> {
        self.streaks.get(participant).copied()
    }

    pub fn previous_sequence(&self) -> Option<u32> {
        self.previous_sequence
    }

    /// Finalize into one record per tracked participant, zero streaks included
    pub fn finish(self) -> Vec<StreakRecord> {
        self.streaks
            .into_iter()
            .map(|(student_id, current_streak)| StreakRecord {
                student_id,
                current_streak,
            })
            .collect()
    }

    /// Load tracker state from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize tracker state to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Distinct non-empty participant identifiers of a batch, or `None` when the
/// batch lacks the identifier or timestamp column
pub fn participant_set(batch: &Batch) -> Option<BTreeSet<ParticipantId>> {
    if !batch.has_column(RECORDED_DATE_COLUMN) || !batch.has_column(PARTICIPANT_COLUMN) {
        return None;
    }
    Some(
        batch
            .rows()
            .iter()
            .filter_map(|row| row.get(PARTICIPANT_COLUMN))
            .map(ParticipantId::from)
            .collect(),
    )
}
