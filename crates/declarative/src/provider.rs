//! Provider and callback traits
//!
//! These traits keep the crate free of any knowledge about how sub-resources
//! are enumerated or changed, or how progress is shown.

use crate::plan::Operation;
use crate::record::Record;
use crate::types::ApplyResult;
use anyhow::Result;

/// Enumerates and changes the sub-resources behind one collection property
///
/// Implementations do the I/O; retries for transient failures belong here,
/// not in reconciliation.
pub trait Provider {
    /// Kind of sub-resource, for display (e.g. "toolchain")
    fn kind(&self) -> &'static str;

    /// List the sub-resources currently present
    ///
    /// May include noise; the normalizer filters it out.
    fn observe(&self) -> Result<Vec<Record>>;

    /// Create the sub-resource described by a normalized desired record
    fn add(&self, record: &Record) -> Result<()>;

    /// Delete the sub-resource described by a normalized observed record
    fn remove(&self, record: &Record) -> Result<()>;
}

impl<P: Provider + ?Sized> Provider for &P {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn observe(&self) -> Result<Vec<Record>> {
        (**self).observe()
    }

    fn add(&self, record: &Record) -> Result<()> {
        (**self).add(record)
    }

    fn remove(&self, record: &Record) -> Result<()> {
        (**self).remove(record)
    }
}

/// Progress callback for plan execution
pub trait ProgressCallback {
    /// Called once before any operation runs
    fn on_start(&mut self, kind: &str, count: usize);

    /// Called when an operation starts
    fn on_operation_start(&mut self, op: &Operation);

    /// Called when an operation completes
    fn on_operation_complete(&mut self, op: &Operation, result: &ApplyResult);

    /// Called after the last operation
    fn on_finish(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _kind: &str, _count: usize) {}
    fn on_operation_start(&mut self, _op: &Operation) {}
    fn on_operation_complete(&mut self, _op: &Operation, _result: &ApplyResult) {}
    fn on_finish(&mut self) {}
}
