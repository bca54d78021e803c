//! Record identity
//!
//! An identity is a BLAKE3 digest over a record's identity key (by default
//! every field but the lifecycle marker), fed in sorted key order so it never
//! depends on how the record was built. Distinct records sharing a digest
//! are not detected here; the reconciler can double-check matches
//! structurally (see [`crate::ReconcileOptions`]).

use crate::record::Record;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Key used to match a desired record with an observed one
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Identity over every field of `record`
    ///
    /// Callers strip the lifecycle marker first; see
    /// [`crate::Normalizer::identity_key`].
    pub fn of(record: &Record) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(record.len() as u64).to_le_bytes());
        for (field, value) in record.iter() {
            hash_str(&mut hasher, field);
            hash_value(&mut hasher, value);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex prefix for logs
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short())
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// Every item is length- or tag-prefixed so adjacent values cannot run together.
fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_value(hasher: &mut blake3::Hasher, value: &Value) {
    match value {
        Value::Null => {
            hasher.update(b"n");
        }
        Value::Bool(b) => {
            hasher.update(if *b { b"t" } else { b"f" });
        }
        Value::Number(n) => {
            hasher.update(b"#");
            hash_str(hasher, &n.to_string());
        }
        Value::String(s) => {
            hasher.update(b"s");
            hash_str(hasher, s);
        }
        Value::Array(items) => {
            hasher.update(b"[");
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update(b"{");
            hasher.update(&(map.len() as u64).to_le_bytes());
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, item) in entries {
                hash_str(hasher, key);
                hash_value(hasher, item);
            }
        }
    }
}
