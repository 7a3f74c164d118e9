//! badgeboard - badge and streak derivation for repeated-measures survey data
//!
//! badgeboard turns per-problem-set survey exports into participant
//! recognition through a deterministic pipeline: raw export cleaning →
//! field normalization → badge rule evaluation → badge aggregation, with a
//! separate ordered pass for attendance streaks.
//!
//! ## Modules
//!
//! - **Badges**: rule engine over one normalized row, plus cross-batch totals
//! - **Streaks**: consecutive-attendance tracking over ordered problem sets

pub mod aggregate;
pub mod badges;
pub mod cleaning;
pub mod config;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod streak;
pub mod types;

pub use aggregate::BadgeAggregator;
pub use badges::BadgeEngine;
pub use config::PipelineConfig;
pub use error::BadgeError;
pub use pipeline::{badge_folder, clean_folder, count_folder, run_all, streak_folder, BadgeProcessor};
pub use schema::Batch;
pub use streak::StreakTracker;
pub use types::{
    AggregateCounts, AssignmentRecord, BadgeAssignment, BadgeLabel, EnduranceStars, ParticipantId,
    Row, StreakRecord,
};

/// badgeboard version
pub const BADGEBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");
