//! rustup collections as declarative resources
//!
//! Each collection has a normalizer, which turns config entries and rustup
//! output into comparable records, and a provider, which lists and changes
//! the real installation through [`toolchain::Client`].
//!
//! Both collections use the default content identity, so normalized records
//! carry only the fields rustup can report back.

pub mod targets;
pub mod toolchains;

pub use targets::{TargetNormalizer, TargetProvider};
pub use toolchains::{ToolchainNormalizer, ToolchainProvider};

use declarative::{ENSURE, NormalizeError, Record, TITLE};

/// Field naming the toolchain a target belongs to
pub const TOOLCHAIN: &str = "toolchain";

/// The record's title, or a normalization error
fn require_title(record: &Record) -> Result<&str, NormalizeError> {
    match record.title() {
        Some(title) if !title.trim().is_empty() => Ok(title),
        Some(_) => Err(NormalizeError::invalid_field(TITLE, "must not be empty")),
        None => Err(NormalizeError::missing_field(TITLE)),
    }
}

/// Fail on fields other than title, ensure and `allowed`
fn reject_unknown_fields(record: &Record, allowed: &[&str]) -> Result<(), NormalizeError> {
    match record
        .iter()
        .map(|(field, _)| field)
        .find(|field| *field != TITLE && *field != ENSURE && !allowed.contains(field))
    {
        Some(field) => Err(NormalizeError {
            message: format!("unsupported field '{field}'"),
            field: Some(field.to_string()),
        }),
        None => Ok(()),
    }
}

/// Fail on `ensure` values other than present and absent
fn check_ensure(record: &Record) -> Result<(), NormalizeError> {
    match record.get(ENSURE) {
        None => Ok(()),
        Some(value) => match value.as_str() {
            Some(declarative::PRESENT | declarative::ABSENT) => Ok(()),
            _ => Err(NormalizeError::invalid_field(
                ENSURE,
                format!("expected \"present\" or \"absent\", got {value}"),
            )),
        },
    }
}
