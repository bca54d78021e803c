//! Collection reconciliation
//!
//! Matches a desired collection against an observed one by identity and
//! classifies every identity:
//!
//! | desired            | observed | outcome      |
//! |--------------------|----------|--------------|
//! | present            | -        | add          |
//! | marked absent      | -        | nothing      |
//! | -                  | present  | remove       |
//! | marked absent      | present  | remove       |
//! | present, same      | present  | in sync      |
//! | present, different | present  | modify       |
//!
//! "Same" compares normalized records with the lifecycle marker removed.

use crate::error::{Error, Result, Side};
use crate::identity::Identity;
use crate::normalize::{DefaultNormalizer, Normalizer};
use crate::plan::{ChangePlan, Modification, PlannedRecord};
use crate::record::Record;
use std::collections::HashMap;

/// Options controlling reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compare identity keys structurally whenever two identities match
    ///
    /// With this on, a digest collision between different keys is treated
    /// as two distinct records instead of a match or a duplicate.
    pub verify_identity: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            verify_identity: true,
        }
    }
}

/// A normalized record with everything the classification needs
#[derive(Debug)]
struct Entry {
    identity: Identity,
    key: Record,
    record: Record,
    content: Record,
    absent: bool,
}

impl Entry {
    fn planned(&self) -> PlannedRecord {
        PlannedRecord {
            identity: self.identity,
            record: self.record.clone(),
        }
    }
}

/// One side's surviving entries, indexed by identity
#[derive(Debug)]
struct Indexed {
    side: Side,
    entries: Vec<Entry>,
    by_identity: HashMap<Identity, Vec<usize>>,
}

impl Indexed {
    fn new(side: Side, capacity: usize) -> Self {
        Self {
            side,
            entries: Vec::with_capacity(capacity),
            by_identity: HashMap::with_capacity(capacity),
        }
    }

    fn insert(&mut self, entry: Entry, verify: bool) -> Result<()> {
        let bucket = self.by_identity.entry(entry.identity).or_default();
        for &i in bucket.iter() {
            let existing = &self.entries[i];
            if !verify || existing.key == entry.key {
                return Err(Error::IdentityCollision {
                    side: self.side,
                    identity: entry.identity,
                    first: existing.record.label(),
                    second: entry.record.label(),
                });
            }
            log::warn!(
                "{} entries '{}' and '{}' share identity {} but differ; keeping both",
                self.side,
                existing.record.label(),
                entry.record.label(),
                entry.identity.short()
            );
        }
        bucket.push(self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    fn find(&self, entry: &Entry, verify: bool) -> Option<usize> {
        self.by_identity
            .get(&entry.identity)?
            .iter()
            .copied()
            .find(|&i| !verify || self.entries[i].key == entry.key)
    }
}

/// What happens to an observed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Unwanted,
    Kept,
    Removed,
}

/// Reconciles desired and observed collections through a [`Normalizer`]
///
/// Stateless: the same inputs always give the same plan.
///
/// # Example
///
/// ```
/// use declarative::{Reconciler, Record};
///
/// let reconciler = Reconciler::default();
/// let desired = vec![Record::titled("stable").with("ensure", "absent")];
/// let observed = vec![Record::titled("stable")];
///
/// let plan = reconciler.reconcile(&desired, &observed).unwrap();
/// assert_eq!(plan.to_remove.len(), 1);
/// assert!(!plan.is_in_sync());
/// ```
#[derive(Debug, Clone)]
pub struct Reconciler<N = DefaultNormalizer> {
    normalizer: N,
    options: ReconcileOptions,
}

impl Default for Reconciler<DefaultNormalizer> {
    fn default() -> Self {
        Self::new(DefaultNormalizer)
    }
}

impl<N: Normalizer> Reconciler<N> {
    /// Create a reconciler with default options
    pub fn new(normalizer: N) -> Self {
        Self {
            normalizer,
            options: ReconcileOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// The normalizer in use
    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    /// The options in use
    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Compute the change plan that converges `observed` onto `desired`
    ///
    /// Neither collection is modified; normalization hooks receive copies.
    ///
    /// # Errors
    ///
    /// [`Error::IdentityCollision`] if two surviving records on one side
    /// share an identity, [`Error::Normalization`] if a hook rejects a
    /// record.
    pub fn reconcile(&self, desired: &[Record], observed: &[Record]) -> Result<ChangePlan> {
        let verify = self.options.verify_identity;
        let wanted = self.collect(Side::Desired, desired)?;
        let found = self.collect(Side::Observed, observed)?;

        let mut fates = vec![Fate::Unwanted; found.entries.len()];
        let mut plan = ChangePlan::default();

        for entry in &wanted.entries {
            let Some(i) = found.find(entry, verify) else {
                if entry.absent {
                    log::trace!("'{}' is absent as desired", entry.record.label());
                } else {
                    log::trace!("'{}' is missing", entry.record.label());
                    plan.to_add.push(entry.planned());
                }
                continue;
            };

            let current = &found.entries[i];
            if entry.absent {
                log::trace!("'{}' is present but should be absent", entry.record.label());
                fates[i] = Fate::Removed;
            } else if entry.content == current.content {
                log::trace!("'{}' is in sync", entry.record.label());
                fates[i] = Fate::Kept;
                plan.in_sync.push(entry.planned());
            } else {
                log::trace!("'{}' differs", entry.record.label());
                fates[i] = Fate::Kept;
                plan.to_modify.push(Modification {
                    identity: entry.identity,
                    from: current.record.clone(),
                    to: entry.record.clone(),
                });
            }
        }

        for (entry, fate) in found.entries.iter().zip(&fates) {
            if *fate != Fate::Kept {
                if *fate == Fate::Unwanted {
                    log::trace!("'{}' is not desired", entry.record.label());
                }
                plan.to_remove.push(entry.planned());
            }
        }

        let summary = plan.summary();
        log::debug!(
            "reconciled {} desired / {} observed: +{} -{} ~{} ={}",
            desired.len(),
            observed.len(),
            summary.additions,
            summary.removals,
            summary.modifications,
            summary.unchanged
        );

        Ok(plan)
    }

    /// Whether `observed` already satisfies `desired`
    pub fn is_in_sync(&self, desired: &[Record], observed: &[Record]) -> Result<bool> {
        Ok(self.reconcile(desired, observed)?.is_in_sync())
    }

    /// Normalize one side and index it, dropping skipped records
    fn collect(&self, side: Side, records: &[Record]) -> Result<Indexed> {
        let marker = self.normalizer.marker_field();
        let mut collected = Indexed::new(side, records.len());

        for raw in records {
            let absent = side == Side::Desired && self.normalizer.is_marked_absent(raw);
            let normalized = match side {
                Side::Desired => self.normalizer.normalize_desired(raw.clone()),
                Side::Observed => self.normalizer.normalize_observed(raw.clone()),
            }
            .map_err(|source| Error::Normalization {
                side,
                title: raw.label(),
                source,
            })?;

            let Some(record) = normalized else {
                log::debug!("skipping {side} entry '{}'", raw.label());
                continue;
            };

            let key = self.normalizer.identity_key(&record);
            let entry = Entry {
                identity: self.normalizer.identity(&record),
                key,
                content: record.without(marker),
                record,
                absent,
            };
            collected.insert(entry, self.options.verify_identity)?;
        }

        Ok(collected)
    }
}

/// Reconcile with the default normalizer
pub fn reconcile(desired: &[Record], observed: &[Record]) -> Result<ChangePlan> {
    Reconciler::default().reconcile(desired, observed)
}
