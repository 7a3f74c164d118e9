//! Badge aggregation
//!
//! Folds per-row badge assignments into per-participant and overall tallies,
//! and projects assignments into the filtered per-batch listing.

use crate::types::{AggregateCounts, AssignmentRecord, BadgeAssignment, ParticipantId};

/// Label string dropped from listings as a malformed-export artifact
pub const DEGENERATE_LABELS: &str = "Commitment badge (4 stars)";

/// Fold one row's labels into the counts and hand them back.
///
/// Counts accumulate across batches; a participant appearing twice is
/// counted twice.
pub fn fold<I, S>(participant: &ParticipantId, labels: I, mut state: AggregateCounts) -> AggregateCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for label in labels {
        let label = label.as_ref();
        *state
            .by_participant
            .entry(participant.clone())
            .or_default()
            .entry(label.to_string())
            .or_default() += 1;
        *state.overall.entry(label.to_string()).or_default() += 1;
    }
    state
}

/// Accumulator owning an [`AggregateCounts`] for the duration of one run
#[derive(Debug, Clone, Default)]
pub struct BadgeAggregator {
    counts: AggregateCounts,
}

impl BadgeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an in-memory assignment
    pub fn add_assignment(&mut self, assignment: &BadgeAssignment) {
        let labels = assignment.labels.iter().map(ToString::to_string);
        self.counts = fold(&assignment.participant, labels, std::mem::take(&mut self.counts));
    }

    /// Fold a listing record read back from disk
    pub fn add_record(&mut self, record: &AssignmentRecord) {
        self.counts = fold(&record.student_id, record.labels(), std::mem::take(&mut self.counts));
    }

    pub fn counts(&self) -> &AggregateCounts {
        &self.counts
    }

    pub fn finish(self) -> AggregateCounts {
        self.counts
    }
}

/// Whether a listing record is an artifact of malformed source data
pub fn is_artifact(record: &AssignmentRecord) -> bool {
    record.student_id.is_header_leak() || record.badges == DEGENERATE_LABELS
}

/// Project assignments into listing records, dropping artifacts
pub fn listing(assignments: &[BadgeAssignment]) -> Vec<AssignmentRecord> {
    assignments
        .iter()
        .map(BadgeAssignment::to_record)
        .filter(|record| !is_artifact(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BadgeLabel;
    use pretty_assertions::assert_eq;

    fn assignment(id: &str, labels: Vec<BadgeLabel>) -> BadgeAssignment {
        BadgeAssignment {
            participant: ParticipantId::from(id),
            labels,
        }
    }

    #[test]
    fn test_fold_counts_per_participant_and_overall() {
        let s1 = ParticipantId::from("S1");
        let s2 = ParticipantId::from("S2");

        let state = fold(&s1, ["Exertion", "Community"], AggregateCounts::default());
        let state = fold(&s2, ["Exertion"], state);
        let state = fold(&s1, ["Exertion"], state);

        assert_eq!(state.participant_count(&s1, "Exertion"), 2);
        assert_eq!(state.participant_count(&s1, "Community"), 1);
        assert_eq!(state.participant_count(&s2, "Community"), 0);
        assert_eq!(state.overall_count("Exertion"), 3);
        assert_eq!(state.overall_count("Community"), 1);
    }

    #[test]
    fn test_empty_labels_do_not_register_participant() {
        let state = fold(
            &ParticipantId::from("S1"),
            Vec::<String>::new(),
            AggregateCounts::default(),
        );
        assert!(state.by_participant.is_empty());
        assert!(state.overall.is_empty());
    }

    #[test]
    fn test_duplicate_rows_double_count() {
        let mut aggregator = BadgeAggregator::new();
        let row = assignment("S1", vec![BadgeLabel::Initiative]);
        aggregator.add_assignment(&row);
        aggregator.add_assignment(&row);

        let counts = aggregator.finish();
        assert_eq!(counts.participant_count(&ParticipantId::from("S1"), "Initiative"), 2);
    }

    #[test]
    fn test_add_record_splits_joined_labels() {
        let mut aggregator = BadgeAggregator::new();
        aggregator.add_record(&AssignmentRecord {
            student_id: ParticipantId::from("S3"),
            badges: "Exertion, Endurance (both stars),Determination".to_string(),
        });
        aggregator.add_record(&AssignmentRecord {
            student_id: ParticipantId::from("S4"),
            badges: String::new(),
        });

        let counts = aggregator.counts();
        assert_eq!(counts.overall.len(), 3);
        assert_eq!(counts.overall_count("Endurance (both stars)"), 1);
        assert!(!counts.by_participant.contains_key(&ParticipantId::from("S4")));
    }

    #[test]
    fn test_listing_drops_artifacts() {
        let assignments = vec![
            assignment("External Data Reference", vec![BadgeLabel::Exertion]),
            assignment("S1", vec![BadgeLabel::Commitment(4)]),
            assignment("S2", vec![BadgeLabel::Exertion, BadgeLabel::Commitment(4)]),
            assignment("S3", vec![]),
        ];

        let records = listing(&assignments);
        let ids: Vec<_> = records.iter().map(|r| r.student_id.as_str()).collect();

        assert_eq!(ids, vec!["S2", "S3"]);
        assert_eq!(records[0].badges, "Exertion, Commitment badge (4 stars)");
        assert!(records.iter().all(|r| !is_artifact(r)));
    }
}
