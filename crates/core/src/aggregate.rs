//! Aggregate root trait and persistence version tracking.

use serde::{Deserialize, Serialize};

/// Persistence version of an aggregate, used for optimistic concurrency.
///
/// `Empty` means the aggregate has never been written to the store. Once
/// persisted, the store is the only source of new versions: an aggregate
/// accepts a `Committed` value on rehydration and never advances it locally.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// Never persisted.
    Empty,
    /// Persisted at this version (>= 0, incremented by 1 per successful write).
    Committed(u64),
}

impl Version {
    pub fn is_empty(self) -> bool {
        matches!(self, Version::Empty)
    }

    /// The committed version number, if the aggregate has been persisted.
    pub fn committed(self) -> Option<u64> {
        match self {
            Version::Empty => None,
            Version::Committed(v) => Some(v),
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::Empty
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Version::Empty => f.write_str("empty"),
            Version::Committed(v) => write!(f, "{v}"),
        }
    }
}

/// Aggregate root marker + minimal interface.
///
/// This is intentionally small so domain modules can decide how they model
/// state transitions without bringing in any infrastructure concerns.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Current persistence version of the aggregate's state.
    fn version(&self) -> Version;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_version_has_no_committed_number() {
        assert!(Version::Empty.is_empty());
        assert_eq!(Version::Empty.committed(), None);
    }

    #[test]
    fn committed_version_exposes_its_number() {
        let v = Version::Committed(3);
        assert!(!v.is_empty());
        assert_eq!(v.committed(), Some(3));
        assert_eq!(v.to_string(), "3");
    }
}
