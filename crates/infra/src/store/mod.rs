//! Key-value store boundary.
//!
//! This module defines an infrastructure-facing abstraction over a
//! wide-column store with conditional and transactional writes, without
//! making any assumptions about the concrete backend.

pub mod in_memory;
pub mod r#trait;
pub mod types;

pub use in_memory::InMemoryStore;
pub use r#trait::{StoreClient, StoreError};
pub use types::{
    AttrValue, PARTITION_KEY, PutCondition, PutRecord, ROW_KEY, Record, TransactItem,
    VERSION_ATTR, WriteRequest,
};
