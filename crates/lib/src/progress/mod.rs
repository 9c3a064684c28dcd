//! Persisted pipeline progress.
//!
//! Replaces bare marker files with a versioned JSON record of which
//! milestones a previous run reached. The pipeline still verifies each
//! milestone's postcondition on disk before trusting it.

mod storage;
mod types;

pub use storage::ProgressStore;
pub use types::{Milestone, MilestoneRecord, PROGRESS_VERSION, ProgressError, ProgressState};
