//! Store client boundary.

use thiserror::Error;

use super::types::{Record, WriteRequest};

/// Store operation error.
///
/// These are **infrastructure errors** (conditional failures, malformed rows,
/// transport) as opposed to domain errors (validation, missing entries).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional check failed. For a transactional write this means the
    /// entire set was rejected with no partial effect.
    #[error("conditional check failed: {0}")]
    Conflict(String),

    /// A record was structurally invalid (missing keys, wrong attribute type).
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The store could not be reached or is in a broken state.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Client for a wide-column store offering conditional single-record puts,
/// atomic multi-record writes, and partition-range queries.
///
/// Implementations wrap a concrete backend (network driver, in-memory fake).
/// The contract mirrors what the repository layer needs and nothing more;
/// endpoint and credential configuration belong to the implementation.
#[async_trait::async_trait]
pub trait StoreClient: Send + Sync {
    /// Apply a write request. Conditional failures surface as
    /// [`StoreError::Conflict`]; transactions are all-or-nothing.
    async fn write(&self, request: WriteRequest) -> Result<(), StoreError>;

    /// Return every record sharing `partition_key`, in no particular order.
    /// An unknown partition yields an empty vector.
    async fn query(&self, partition_key: &str) -> Result<Vec<Record>, StoreError>;
}

// Shared clients can be injected as `Arc<S>` without a wrapper type.
#[async_trait::async_trait]
impl<S: StoreClient + ?Sized> StoreClient for std::sync::Arc<S> {
    async fn write(&self, request: WriteRequest) -> Result<(), StoreError> {
        (**self).write(request).await
    }

    async fn query(&self, partition_key: &str) -> Result<Vec<Record>, StoreError> {
        (**self).query(partition_key).await
    }
}
