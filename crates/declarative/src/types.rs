//! Types shared by the plan executor

use serde::{Deserialize, Serialize};

/// Result of applying a single operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Sub-resource was created
    Added,
    /// Sub-resource was deleted
    Removed,
    /// Operation failed
    Failed { error: String },
    /// Operation was not attempted
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Added | Self::Removed)
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub added: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ApplySummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.added + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of operations processed
    pub fn total(&self) -> usize {
        self.added + self.removed + self.skipped + self.failed
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ApplySummary) {
        self.added += other.added;
        self.removed += other.removed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::Added => self.added += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for applying a plan
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Stop at the first failing operation instead of recording it
    pub fail_fast: bool,
}
