//! Survey batch schema
//!
//! This module models one problem set's export as a batch of rows with a
//! known column list, loads batches from CSV (probing for the real header
//! row in raw exports), and extracts the metadata embedded in batch
//! filenames.

mod batch;
mod filename;

pub use batch::*;
pub use filename::*;
