//! Normalization hooks
//!
//! A [`Normalizer`] adapts raw records from either side into the form used
//! for identity and comparison, and decides whether a record takes part at
//! all. Domains implement only the hooks whose default is not enough.
//!
//! # Example
//!
//! ```
//! use declarative::{NormalizeError, Normalizer, Record};
//!
//! struct Lowercase;
//!
//! impl Normalizer for Lowercase {
//!     fn coerce_desired(&self, record: &mut Record) -> Result<(), NormalizeError> {
//!         let title = record
//!             .title()
//!             .ok_or_else(|| NormalizeError::missing_field("title"))?
//!             .to_lowercase();
//!         record.insert("title", title);
//!         Ok(())
//!     }
//! }
//!
//! let raw = Record::titled("Stable");
//! let normalized = Lowercase.normalize_desired(raw.clone()).unwrap().unwrap();
//! assert_eq!(normalized.title(), Some("stable"));
//! assert_eq!(raw.title(), Some("Stable"));
//! ```

use crate::error::NormalizeError;
use crate::identity::Identity;
use crate::record::{ABSENT, ENSURE, Record};

/// Hook surface used by the reconciler
///
/// `normalize_*` receive the record by value: the reconciler hands them a
/// copy, so a hook can never touch the caller's collection. Returning
/// `Ok(None)` drops the record from reconciliation entirely.
pub trait Normalizer {
    /// Field carrying the lifecycle marker
    ///
    /// Excluded from identity and from content comparison.
    fn marker_field(&self) -> &str {
        ENSURE
    }

    /// In-place coercion of a desired record
    fn coerce_desired(&self, _record: &mut Record) -> Result<(), NormalizeError> {
        Ok(())
    }

    /// In-place coercion of an observed record
    fn coerce_observed(&self, _record: &mut Record) -> Result<(), NormalizeError> {
        Ok(())
    }

    /// Normalize a desired record, or return `None` to skip it
    ///
    /// Override only when skipping is needed; plain field coercion belongs
    /// in [`Normalizer::coerce_desired`].
    fn normalize_desired(&self, mut record: Record) -> Result<Option<Record>, NormalizeError> {
        self.coerce_desired(&mut record)?;
        Ok(Some(record))
    }

    /// Normalize an observed record, or return `None` to skip it
    ///
    /// Observed entries that do not really exist (tombstones, placeholder
    /// lines from the enumerating tool) must be skipped here.
    fn normalize_observed(&self, mut record: Record) -> Result<Option<Record>, NormalizeError> {
        self.coerce_observed(&mut record)?;
        Ok(Some(record))
    }

    /// Whether a raw desired record asks for removal
    ///
    /// Checked before normalization. If this is true and nothing observed
    /// matches, the record is not a change.
    fn is_marked_absent(&self, record: &Record) -> bool {
        record.get_str(self.marker_field()) == Some(ABSENT)
    }

    /// The part of a normalized record that identifies it
    ///
    /// Defaults to every field except the marker. The reconciler compares
    /// keys structurally when verifying identity matches.
    fn identity_key(&self, record: &Record) -> Record {
        record.without(self.marker_field())
    }

    /// Identity of a normalized record
    fn identity(&self, record: &Record) -> Identity {
        Identity::of(&self.identity_key(record))
    }
}

/// Normalizer with no domain coercion
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {}

/// Normalizer whose identity covers only some fields
///
/// With a content identity two records either match exactly or not at all.
/// Keying on e.g. `title` lets the same sub-resource be found with different
/// content, which the reconciler reports as a modification.
#[derive(Debug, Clone)]
pub struct KeyedNormalizer {
    fields: Vec<String>,
}

impl KeyedNormalizer {
    /// Key records by the given fields
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Key records by title only
    pub fn by_title() -> Self {
        Self::new([crate::record::TITLE])
    }

    /// The key fields
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Normalizer for KeyedNormalizer {
    fn identity_key(&self, record: &Record) -> Record {
        record
            .iter()
            .filter(|(field, _)| *field != self.marker_field())
            .filter(|(field, _)| self.fields.iter().any(|f| f == field))
            .map(|(field, value)| (field, value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PRESENT;

    #[test]
    fn test_default_normalization_is_identity() {
        let raw = Record::titled("stable").with(ENSURE, PRESENT);
        let normalized = DefaultNormalizer.normalize_desired(raw.clone()).unwrap();
        assert_eq!(normalized, Some(raw.clone()));
        let observed = DefaultNormalizer.normalize_observed(raw.clone()).unwrap();
        assert_eq!(observed, Some(raw));
    }

    #[test]
    fn test_marked_absent_only_for_literal_absent() {
        let n = DefaultNormalizer;
        assert!(n.is_marked_absent(&Record::titled("a").with(ENSURE, "absent")));
        assert!(!n.is_marked_absent(&Record::titled("a").with(ENSURE, "present")));
        assert!(!n.is_marked_absent(&Record::titled("a").with(ENSURE, "Absent")));
        assert!(!n.is_marked_absent(&Record::titled("a")));
    }

    #[test]
    fn test_coercion_does_not_leak_into_original() {
        struct Defaulting;
        impl Normalizer for Defaulting {
            fn coerce_desired(&self, record: &mut Record) -> Result<(), NormalizeError> {
                record.insert("profile", "default");
                Ok(())
            }
        }

        let raw = Record::titled("stable");
        let normalized = Defaulting.normalize_desired(raw.clone()).unwrap().unwrap();
        assert_eq!(normalized.get_str("profile"), Some("default"));
        assert!(!raw.contains("profile"));
    }

    #[test]
    fn test_coercion_errors_propagate() {
        struct Strict;
        impl Normalizer for Strict {
            fn coerce_observed(&self, record: &mut Record) -> Result<(), NormalizeError> {
                record
                    .title()
                    .map(|_| ())
                    .ok_or_else(|| NormalizeError::missing_field("title"))
            }
        }

        let err = Strict.normalize_observed(Record::new()).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("title"));
    }

    #[test]
    fn test_keyed_identity_ignores_other_fields() {
        let n = KeyedNormalizer::by_title();
        let a = Record::titled("nightly").with("profile", "minimal");
        let b = Record::titled("nightly").with("profile", "complete");
        assert_eq!(n.identity(&a), n.identity(&b));
        assert_ne!(DefaultNormalizer.identity(&a), DefaultNormalizer.identity(&b));
    }

    #[test]
    fn test_keyed_key_is_a_projection() {
        let n = KeyedNormalizer::new(["title", "toolchain"]);
        let record = Record::titled("wasm32-unknown-unknown")
            .with("toolchain", "stable")
            .with("note", "for web builds");
        let key = n.identity_key(&record);
        assert_eq!(key.len(), 2);
        assert!(!key.contains("note"));
    }

    #[test]
    fn test_default_identity_ignores_marker() {
        let n = DefaultNormalizer;
        let present = Record::titled("stable").with(ENSURE, PRESENT);
        let absent = Record::titled("stable").with(ENSURE, ABSENT);
        let bare = Record::titled("stable");
        assert_eq!(n.identity(&present), n.identity(&absent));
        assert_eq!(n.identity(&present), n.identity(&bare));
    }

    #[test]
    fn test_keyed_identity_never_includes_marker() {
        let n = KeyedNormalizer::new(["title", "ensure"]);
        let a = Record::titled("nightly").with(ENSURE, "absent");
        let b = Record::titled("nightly").with(ENSURE, "present");
        assert_eq!(n.identity(&a), n.identity(&b));
    }
}
