//! Wire-level types for the key-value store contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute name of the partition key. Every record of one cart shares it.
pub const PARTITION_KEY: &str = "pk";

/// Attribute name of the row key within a partition.
pub const ROW_KEY: &str = "sk";

/// Attribute name of the version counter on a root record.
pub const VERSION_ATTR: &str = "version";

/// A typed scalar attribute value, string-encoded on the wire.
///
/// Numbers travel as strings (`{"N": "42"}`, matching the store's JSON
/// shape). Conversion between the encoded form and native integers happens
/// here and nowhere else; the rest of the crate works with `u64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    /// String attribute.
    S(String),
    /// Numeric attribute, string-encoded.
    N(String),
}

impl AttrValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn number(value: u64) -> Self {
        Self::N(value.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            Self::N(_) => None,
        }
    }

    /// Decode a numeric attribute. `None` for string attributes or values
    /// that do not parse as a non-negative integer.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::S(_) => None,
            Self::N(n) => n.parse().ok(),
        }
    }
}

/// One stored row: a flat map of attribute name to scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, AttrValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, name: &str, value: AttrValue) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: &str, value: AttrValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn partition_key(&self) -> Option<&str> {
        self.get(PARTITION_KEY).and_then(AttrValue::as_str)
    }

    pub fn row_key(&self) -> Option<&str> {
        self.get(ROW_KEY).and_then(AttrValue::as_str)
    }
}

/// Existence precondition on a single-record put.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutCondition {
    /// Unconditional; overwrites any existing record (last write wins).
    None,
    /// Fail if a record with the same (partition key, row key) exists.
    MustNotExist,
}

/// A single-record put, optionally conditioned on non-existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRecord {
    pub record: Record,
    pub condition: PutCondition,
}

/// One operation inside a transactional write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactItem {
    Put(PutRecord),
    /// Increment the record's `version` attribute by exactly 1, conditioned
    /// on the stored value equalling `expected`.
    IncrementVersion {
        partition_key: String,
        row_key: String,
        expected: u64,
    },
}

/// A write request as submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteRequest {
    /// Single conditional put; used when only one record is touched.
    Put(PutRecord),
    /// Atomic multi-record write: any failed condition aborts the whole set
    /// with no partial effect.
    Transact(Vec<TransactItem>),
}
