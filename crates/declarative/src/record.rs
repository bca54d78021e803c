//! Records: the unit of a collection-valued property
//!
//! A record is a free-form mapping from field name to value. Only two
//! fields are reserved: `title` names the record for humans, and `ensure`
//! carries the desired lifecycle state on the "should" side.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field holding the human-meaningful name of a record
pub const TITLE: &str = "title";

/// Field holding the lifecycle state of a desired record
pub const ENSURE: &str = "ensure";

/// `ensure` value requesting removal
pub const ABSENT: &str = "absent";

/// `ensure` value requesting presence
pub const PRESENT: &str = "present";

/// A single structured record from a desired or observed collection
///
/// Fields are kept sorted, so two records built from the same fields in a
/// different order are equal and hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self::new().with(TITLE, title.into())
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field value if it is a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Check whether a field is set
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The record's title, if it has a string one
    pub fn title(&self) -> Option<&str> {
        self.get_str(TITLE)
    }

    /// The record's `ensure` value, if it has a string one
    pub fn ensure(&self) -> Option<&str> {
        self.get_str(ENSURE)
    }

    /// A copy of this record without `field`
    pub fn without(&self, field: &str) -> Self {
        let mut copy = self.clone();
        copy.fields.remove(field);
        copy
    }

    /// Iterate over fields in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Label used in logs and error messages
    pub fn label(&self) -> String {
        self.title()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = self.title() {
            return write!(f, "{title}");
        }
        match serde_json::to_string(&self.fields) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "<record>"),
        }
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
