//! Repository for [`Cart`] aggregates.
//!
//! `serialize` and `deserialize` are pure functions over data structures, so
//! the translation protocol is testable without a live store; the injected
//! [`StoreClient`] is confined to [`CartRepository::get`] and
//! [`CartRepository::put`].

use thiserror::Error;
use tracing::{debug, instrument};

use cartstore_cart::{Cart, CartId, LineItem};
use cartstore_core::{AggregateRoot, Version};

use crate::store::r#trait::{StoreClient, StoreError};
use crate::store::types::{
    AttrValue, PARTITION_KEY, PutCondition, PutRecord, ROW_KEY, Record, TransactItem,
    VERSION_ATTR, WriteRequest,
};

/// Partition key prefix shared by every record belonging to one cart.
pub const PARTITION_PREFIX: &str = "cart-";

/// Reserved row key of a cart's root record. Item rows use the SKU instead.
pub const ROOT_ROW_KEY: &str = "__cart";

const QTY_ATTR: &str = "qty";
const PRICE_ATTR: &str = "price";

/// Repository operation error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A partition's result set had records but no root — a missing or
    /// corrupted aggregate. Never silently mapped to an empty cart.
    #[error("malformed aggregate: {0}")]
    MalformedAggregate(String),

    /// The cart's partition holds no records at all.
    #[error("cart not found")]
    NotFound,

    /// Store-layer failure, surfaced unmodified. Conditional-check failures
    /// arrive here as [`StoreError::Conflict`].
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    /// True iff this is an optimistic concurrency conflict the caller should
    /// resolve by reloading and retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::Conflict(_)))
    }

    fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedAggregate(msg.into())
    }
}

fn partition_key(id: &CartId) -> String {
    format!("{PARTITION_PREFIX}{id}")
}

/// The root record insert used when a cart is persisted for the first time.
fn root_insert(cart: &Cart) -> PutRecord {
    PutRecord {
        record: Record::new()
            .with(PARTITION_KEY, AttrValue::string(partition_key(cart.id())))
            .with(ROW_KEY, AttrValue::string(ROOT_ROW_KEY))
            .with(VERSION_ATTR, AttrValue::number(0)),
        condition: PutCondition::MustNotExist,
    }
}

/// An unconditional item-row put. Concurrency is enforced only at the root;
/// item rows are last-write-wins.
fn item_put(cart_partition: &str, item: &LineItem) -> PutRecord {
    PutRecord {
        record: Record::new()
            .with(PARTITION_KEY, AttrValue::string(cart_partition))
            .with(ROW_KEY, AttrValue::string(&item.sku))
            .with(QTY_ATTR, AttrValue::number(item.qty))
            .with(PRICE_ATTR, AttrValue::number(item.price)),
        condition: PutCondition::None,
    }
}

/// Translate a cart's pending state into a single store write.
///
/// A never-persisted cart without changed items becomes one conditional
/// insert of the root record. Anything else becomes an atomic transaction:
/// the root operation (insert or version-increment, carrying the optimistic
/// concurrency check) plus one put per changed item, so a reader can never
/// observe a version bump without its item changes or vice versa.
pub fn serialize(cart: &Cart) -> WriteRequest {
    let changed = cart.changed_items();

    let root = match cart.version() {
        Version::Empty => {
            if changed.is_empty() {
                return WriteRequest::Put(root_insert(cart));
            }
            TransactItem::Put(root_insert(cart))
        }
        Version::Committed(expected) => TransactItem::IncrementVersion {
            partition_key: partition_key(cart.id()),
            row_key: ROOT_ROW_KEY.to_string(),
            expected,
        },
    };

    let cart_partition = partition_key(cart.id());
    let mut items = Vec::with_capacity(changed.len() + 1);
    items.push(root);
    items.extend(
        changed
            .iter()
            .map(|item| TransactItem::Put(item_put(&cart_partition, item))),
    );
    WriteRequest::Transact(items)
}

fn item_from_record(record: &Record) -> Result<LineItem, RepositoryError> {
    let sku = record
        .row_key()
        .ok_or_else(|| RepositoryError::malformed("item record has no row key"))?;
    let qty = record
        .get(QTY_ATTR)
        .and_then(AttrValue::as_number)
        .ok_or_else(|| {
            RepositoryError::malformed(format!("item '{sku}' has no numeric qty"))
        })?;
    let price = record
        .get(PRICE_ATTR)
        .and_then(AttrValue::as_number)
        .ok_or_else(|| {
            RepositoryError::malformed(format!("item '{sku}' has no numeric price"))
        })?;
    Ok(LineItem {
        sku: sku.to_string(),
        qty,
        price,
    })
}

/// Rebuild a cart from the full record set of one partition, in any order.
///
/// The root record supplies the identity and the committed version; every
/// other record is an item row. Fails if no root record is present — that
/// indicates a missing or corrupted aggregate and must not produce a default
/// cart.
pub fn deserialize(records: &[Record]) -> Result<Cart, RepositoryError> {
    let root = records
        .iter()
        .find(|record| record.row_key() == Some(ROOT_ROW_KEY))
        .ok_or_else(|| RepositoryError::malformed("no root record in result set"))?;

    let pk = root
        .partition_key()
        .ok_or_else(|| RepositoryError::malformed("root record has no partition key"))?;
    let id: CartId = pk
        .strip_prefix(PARTITION_PREFIX)
        .ok_or_else(|| {
            RepositoryError::malformed(format!(
                "partition key '{pk}' lacks the '{PARTITION_PREFIX}' prefix"
            ))
        })?
        .parse()
        .map_err(|e| RepositoryError::malformed(format!("bad cart id: {e}")))?;
    let version = root
        .get(VERSION_ATTR)
        .and_then(AttrValue::as_number)
        .ok_or_else(|| RepositoryError::malformed("root record has no numeric version"))?;

    let items = records
        .iter()
        .filter(|record| record.row_key() != Some(ROOT_ROW_KEY))
        .map(item_from_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart::hydrate(id, Version::Committed(version), items))
}

/// Cart repository over an injected [`StoreClient`].
///
/// Performs no local recovery: every store failure, conflicts included,
/// propagates unchanged. Callers needing guaranteed application of an update
/// must layer a read-modify-write retry loop around `get`/mutate/`put`.
#[derive(Debug, Clone)]
pub struct CartRepository<S> {
    client: S,
}

impl<S: StoreClient> CartRepository<S> {
    pub fn new(client: S) -> Self {
        Self { client }
    }

    /// Load a cart by id as a fresh, independently owned aggregate.
    #[instrument(skip(self), fields(cart_id = %cart_id), err)]
    pub async fn get(&self, cart_id: &CartId) -> Result<Cart, RepositoryError> {
        let records = self.client.query(&partition_key(cart_id)).await?;
        if records.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        let cart = deserialize(&records)?;
        debug!(version = %cart.version(), records = records.len(), "cart loaded");
        Ok(cart)
    }

    /// Persist the cart's pending changes.
    ///
    /// On [`RepositoryError::Store`] with a conflict, another writer won the
    /// version race; reload via [`CartRepository::get`] and retry.
    #[instrument(skip(self, cart), fields(cart_id = %cart.id(), version = %cart.version()), err)]
    pub async fn put(&self, cart: &Cart) -> Result<(), RepositoryError> {
        self.client.write(serialize(cart)).await?;
        Ok(())
    }
}
