//! Outcome tracking for batch runs.

use std::fmt;

use crate::error::PersistError;
use crate::executor::WriteResult;

/// Counts for one run, or one worker's share of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Batches handed to the executor.
    pub batches: usize,
    /// Rows in batches the store accepted.
    pub rows_written: usize,
    /// Failed batches whose record was persisted.
    pub dead_lettered: usize,
    /// Failed batches whose record could not be persisted.
    pub persist_failures: usize,
    /// Batches never attempted because the run was cancelled.
    pub skipped: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.batches += other.batches;
        self.rows_written += other.rows_written;
        self.dead_lettered += other.dead_lettered;
        self.persist_failures += other.persist_failures;
        self.skipped += other.skipped;
    }

    pub fn status(&self) -> RunStatus {
        if self.persist_failures > 0 {
            RunStatus::DeadLetterIncomplete {
                persist_failures: self.persist_failures,
            }
        } else if self.dead_lettered > 0 {
            RunStatus::CompletedWithFailures {
                dead_lettered: self.dead_lettered,
            }
        } else {
            RunStatus::Succeeded
        }
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every attempted batch was written.
    Succeeded,
    /// Some batches failed; every failure was recorded.
    CompletedWithFailures { dead_lettered: usize },
    /// At least one failure could not be recorded.
    DeadLetterIncomplete { persist_failures: usize },
}

impl RunStatus {
    /// Whether every failure of the run is accounted for in the dead-letter
    /// destination.
    pub fn is_fully_recorded(&self) -> bool {
        !matches!(self, RunStatus::DeadLetterIncomplete { .. })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::CompletedWithFailures { dead_lettered } => {
                write!(f, "completed with {dead_lettered} dead-lettered batches")
            }
            RunStatus::DeadLetterIncomplete { persist_failures } => {
                write!(f, "dead-letter incomplete: {persist_failures} failures unrecorded")
            }
        }
    }
}

/// Tallies the outcomes seen by one worker.
#[derive(Debug, Default)]
pub struct FailureTracker {
    summary: RunSummary,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one executed batch.
    pub fn record(&mut self, outcome: &Result<WriteResult, PersistError>) {
        self.summary.batches += 1;
        match outcome {
            Ok(WriteResult::Written { rows }) => self.summary.rows_written += rows,
            Ok(WriteResult::DeadLettered { .. }) => self.summary.dead_lettered += 1,
            Err(_) => self.summary.persist_failures += 1,
        }
    }

    /// Record a batch dropped by cancellation.
    pub fn skip(&mut self) {
        self.summary.skipped += 1;
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}
