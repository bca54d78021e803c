//! Error types for reconciliation
//!
//! Every error here is fatal for the property being reconciled. Reconciliation
//! is deterministic, so none of them are worth retrying with the same input.

use crate::identity::Identity;
use std::fmt;
use thiserror::Error;

/// Result type alias for reconciliation
pub type Result<T> = std::result::Result<T, Error>;

/// Which collection a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The desired ("should") collection from configuration
    Desired,
    /// The observed ("is") collection from the managed system
    Observed,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desired => write!(f, "should"),
            Self::Observed => write!(f, "is"),
        }
    }
}

/// Categories of reconciliation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The supplied collections break the input contract
    Configuration,
    /// A single record could not be normalized
    InvalidRecord,
}

impl ErrorCategory {
    /// Reconciliation never benefits from a retry
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get a user-friendly description of this error category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::InvalidRecord => "Invalid record",
        }
    }

    /// Get actionable advice for resolving this error category
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Remove or merge the duplicate entries in your configuration",
            Self::InvalidRecord => "Check the record's fields against what the resource expects",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Failure raised by a normalization hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NormalizeError {
    /// What went wrong
    pub message: String,
    /// Offending field, when there is one
    pub field: Option<String>,
}

impl NormalizeError {
    /// Create an error not tied to a field
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Create an error about a missing required field
    pub fn missing_field(field: &str) -> Self {
        Self {
            message: format!("missing required field '{field}'"),
            field: Some(field.to_string()),
        }
    }

    /// Create an error about a field holding an unusable value
    pub fn invalid_field(field: &str, reason: impl fmt::Display) -> Self {
        Self {
            message: format!("invalid value for '{field}': {reason}"),
            field: Some(field.to_string()),
        }
    }
}

/// Errors that abort a reconciliation
#[derive(Debug, Error)]
pub enum Error {
    /// Two records on the same side share an identity
    #[error("duplicate entries in {side}: '{first}' and '{second}' have the same identity ({})", .identity.short())]
    IdentityCollision {
        /// Side both records came from
        side: Side,
        /// The shared identity
        identity: Identity,
        /// Label of the record seen first
        first: String,
        /// Label of the record seen second
        second: String,
    },

    /// A normalization hook rejected a record
    #[error("cannot normalize {side} entry '{title}': {source}")]
    Normalization {
        /// Side the record came from
        side: Side,
        /// Label of the rejected record
        title: String,
        /// What the hook reported
        #[source]
        source: NormalizeError,
    },
}

impl Error {
    /// Categorize this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IdentityCollision { .. } => ErrorCategory::Configuration,
            Self::Normalization { .. } => ErrorCategory::InvalidRecord,
        }
    }

    /// Side of the reconciliation the error belongs to
    pub fn side(&self) -> Side {
        match self {
            Self::IdentityCollision { side, .. } | Self::Normalization { side, .. } => *side,
        }
    }
}
