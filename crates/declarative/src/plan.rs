//! Change plans produced by reconciliation

use crate::identity::Identity;
use crate::record::Record;
use serde::Serialize;
use std::fmt;

/// A normalized record together with its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRecord {
    /// Identity the record was matched on
    pub identity: Identity,
    /// The normalized record
    pub record: Record,
}

/// A sub-resource present on both sides with different content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    /// Shared identity
    pub identity: Identity,
    /// Observed record
    pub from: Record,
    /// Desired record
    pub to: Record,
}

/// A single operation against the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "record", rename_all = "lowercase")]
pub enum Operation {
    /// Create the sub-resource
    Add(Record),
    /// Delete the sub-resource
    Remove(Record),
}

impl Operation {
    /// The record the operation applies to
    pub fn record(&self) -> &Record {
        match self {
            Self::Add(record) | Self::Remove(record) => record,
        }
    }

    /// Short verb for display
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.record())
    }
}

/// Result of reconciling a desired collection against an observed one
///
/// Entries keep input order: desired order for additions, modifications and
/// unchanged records, observed order for removals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangePlan {
    /// Desired records with no observed counterpart
    pub to_add: Vec<PlannedRecord>,
    /// Observed records that are unwanted or explicitly marked absent
    pub to_remove: Vec<PlannedRecord>,
    /// Records on both sides whose content differs
    pub to_modify: Vec<Modification>,
    /// Records on both sides with equal content
    pub in_sync: Vec<PlannedRecord>,
}

impl ChangePlan {
    /// Whether no change is needed
    pub fn is_in_sync(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_modify.is_empty()
    }

    /// Whether any entry of the plan refers to `identity`
    pub fn touches(&self, identity: &Identity) -> bool {
        self.to_add.iter().any(|p| &p.identity == identity)
            || self.to_remove.iter().any(|p| &p.identity == identity)
            || self.to_modify.iter().any(|m| &m.identity == identity)
    }

    /// Counts per kind of change
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            additions: self.to_add.len(),
            removals: self.to_remove.len(),
            modifications: self.to_modify.len(),
            unchanged: self.in_sync.len(),
        }
    }

    /// Flatten the plan into provider operations
    ///
    /// Removals run first, then each modification as remove followed by
    /// add, then additions.
    pub fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(
            self.to_remove.len() + 2 * self.to_modify.len() + self.to_add.len(),
        );
        ops.extend(
            self.to_remove
                .iter()
                .map(|p| Operation::Remove(p.record.clone())),
        );
        for m in &self.to_modify {
            ops.push(Operation::Remove(m.from.clone()));
            ops.push(Operation::Add(m.to.clone()));
        }
        ops.extend(self.to_add.iter().map(|p| Operation::Add(p.record.clone())));
        ops
    }
}

/// Plan summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Number of records to add
    pub additions: usize,
    /// Number of records to remove
    pub removals: usize,
    /// Number of records to modify
    pub modifications: usize,
    /// Number of records already in sync
    pub unchanged: usize,
}

impl PlanSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &PlanSummary) {
        self.additions += other.additions;
        self.removals += other.removals;
        self.modifications += other.modifications;
        self.unchanged += other.unchanged;
    }
}
