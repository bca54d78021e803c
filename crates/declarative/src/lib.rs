//! # Declarative
//!
//! Reconciliation for collection-valued properties.
//!
//! Given a desired collection of records ("should") and an observed one
//! ("is"), this crate decides whether the observed state already satisfies
//! the desired state and, if not, which records to add, remove or modify.
//!
//! ## Core Concepts
//!
//! - **Record**: a free-form field map with a `title` and, on the desired
//!   side, an `ensure` lifecycle marker
//! - **Normalizer**: per-domain hooks that coerce records, skip noise and
//!   compute identities
//! - **Identity**: the key a desired record is matched on, derived from its
//!   content without the marker
//! - **ChangePlan**: additions, removals, modifications and unchanged records
//! - **Provider**: the collaborator that enumerates and changes the real
//!   sub-resources
//!
//! ## Example
//!
//! ```
//! use declarative::{Reconciler, Record};
//!
//! let desired = vec![
//!     Record::titled("stable").with("ensure", "present"),
//!     Record::titled("beta").with("ensure", "absent"),
//! ];
//! let observed = vec![Record::titled("beta"), Record::titled("nightly")];
//!
//! let plan = Reconciler::default().reconcile(&desired, &observed)?;
//! assert_eq!(plan.to_add.len(), 1);      // stable
//! assert_eq!(plan.to_remove.len(), 2);   // beta, nightly
//! assert!(!plan.is_in_sync());
//! # Ok::<(), declarative::Error>(())
//! ```
//!
//! ## Absence
//!
//! A desired record with `ensure = "absent"` and no observed counterpart is
//! already satisfied and produces no change. Observed records never carry
//! absence; a [`Normalizer`] drops observed entries that do not really exist.

pub mod error;
pub mod executor;
pub mod identity;
pub mod normalize;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod record;
pub mod types;

// Re-export main types at crate root
pub use error::{Error, ErrorCategory, NormalizeError, Result, Side};
pub use executor::{Convergence, apply_plan, converge};
pub use identity::Identity;
pub use normalize::{DefaultNormalizer, KeyedNormalizer, Normalizer};
pub use plan::{ChangePlan, Modification, Operation, PlanSummary, PlannedRecord};
pub use provider::{NoProgress, ProgressCallback, Provider};
pub use reconcile::{ReconcileOptions, Reconciler, reconcile};
pub use record::{ABSENT, ENSURE, PRESENT, Record, TITLE};
pub use types::{ApplyOptions, ApplyResult, ApplySummary};
