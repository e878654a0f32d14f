use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{StoreClient, StoreError};
use super::types::{AttrValue, PutCondition, Record, TransactItem, VERSION_ATTR, WriteRequest};

type RecordKey = (String, String);

/// In-memory store with full conditional and transactional semantics.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<RecordKey, Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_of(record: &Record) -> Result<RecordKey, StoreError> {
        let pk = record
            .partition_key()
            .ok_or_else(|| StoreError::MalformedRecord("missing partition key".to_string()))?;
        let sk = record
            .row_key()
            .ok_or_else(|| StoreError::MalformedRecord("missing row key".to_string()))?;
        Ok((pk.to_string(), sk.to_string()))
    }

    /// Validate one transact item against current state without applying it.
    fn check(records: &HashMap<RecordKey, Record>, item: &TransactItem) -> Result<(), StoreError> {
        match item {
            TransactItem::Put(put) => {
                let key = Self::key_of(&put.record)?;
                if put.condition == PutCondition::MustNotExist && records.contains_key(&key) {
                    return Err(StoreError::Conflict(format!(
                        "record ({}, {}) already exists",
                        key.0, key.1
                    )));
                }
                Ok(())
            }
            TransactItem::IncrementVersion {
                partition_key,
                row_key,
                expected,
            } => {
                let key = (partition_key.clone(), row_key.clone());
                let record = records.get(&key).ok_or_else(|| {
                    StoreError::Conflict(format!(
                        "record ({partition_key}, {row_key}) does not exist"
                    ))
                })?;
                let stored = record
                    .get(VERSION_ATTR)
                    .and_then(AttrValue::as_number)
                    .ok_or_else(|| {
                        StoreError::MalformedRecord(format!(
                            "record ({partition_key}, {row_key}) has no numeric version"
                        ))
                    })?;
                if stored != *expected {
                    return Err(StoreError::Conflict(format!(
                        "version mismatch: expected {expected}, found {stored}"
                    )));
                }
                Ok(())
            }
        }
    }

    fn apply(records: &mut HashMap<RecordKey, Record>, item: TransactItem) {
        match item {
            TransactItem::Put(put) => {
                // Checked by `check`, so key_of cannot fail here.
                if let Ok(key) = Self::key_of(&put.record) {
                    records.insert(key, put.record);
                }
            }
            TransactItem::IncrementVersion {
                partition_key,
                row_key,
                expected,
            } => {
                if let Some(record) = records.get_mut(&(partition_key, row_key)) {
                    record.set(VERSION_ATTR, AttrValue::number(expected + 1));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl StoreClient for InMemoryStore {
    async fn write(&self, request: WriteRequest) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let items = match request {
            WriteRequest::Put(put) => vec![TransactItem::Put(put)],
            WriteRequest::Transact(items) => items,
        };

        // All conditions are validated before anything is applied, so a
        // single failure leaves the store untouched (all-or-nothing).
        for item in &items {
            Self::check(&records, item)?;
        }
        for item in items {
            Self::apply(&mut records, item);
        }
        Ok(())
    }

    async fn query(&self, partition_key: &str) -> Result<Vec<Record>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|((pk, _), _)| pk == partition_key)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
