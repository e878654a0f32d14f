use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cartstore_core::{AggregateRoot, DomainError, DomainResult, Version};

/// SKU prefix reserved for bookkeeping rows in the store (e.g. the cart's
/// root record). Item SKUs must not use it.
pub const RESERVED_SKU_PREFIX: &str = "__";

/// Cart identifier.
///
/// Opaque string: generated ids are UUIDv7, but hydration accepts whatever
/// identifier the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(String);

impl CartId {
    /// Create a new, time-ordered identifier. Prefer passing ids explicitly
    /// in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CartId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CartId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CartId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::invalid_id("CartId: must not be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

/// A cart line item as exposed outside the aggregate.
///
/// The aggregate's internal change flag is bookkeeping and never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub qty: u64,
    /// Price in smallest currency unit (e.g. pence).
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemEntry {
    qty: u64,
    price: u64,
    /// Mutated since load; selected by `changed_items` for persistence.
    changed: bool,
}

/// Aggregate root: a shopping cart and its line items.
///
/// The cart tracks which items were mutated since it was loaded so that a
/// write only has to flush the delta. The version is the cart's optimistic
/// concurrency token: the aggregate never advances it itself, it only accepts
/// a committed value when rehydrated from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: CartId,
    version: Version,
    items: BTreeMap<String, ItemEntry>,
}

impl Cart {
    /// Create an empty, never-persisted cart with a fresh identifier.
    pub fn new() -> Self {
        Self::with_id(CartId::new())
    }

    /// Create an empty, never-persisted cart with an explicit identifier.
    pub fn with_id(id: CartId) -> Self {
        Self {
            id,
            version: Version::Empty,
            items: BTreeMap::new(),
        }
    }

    /// Rebuild a cart from persisted state.
    ///
    /// All items start unchanged: a freshly loaded cart has no pending delta.
    pub fn hydrate(id: CartId, version: Version, items: Vec<LineItem>) -> Self {
        let items = items
            .into_iter()
            .map(|item| {
                (
                    item.sku,
                    ItemEntry {
                        qty: item.qty,
                        price: item.price,
                        changed: false,
                    },
                )
            })
            .collect();
        Self { id, version, items }
    }

    /// Insert or replace the item entry for `sku` and mark it changed.
    pub fn add_item(&mut self, sku: &str, qty: u64, price: u64) -> DomainResult<()> {
        validate_sku(sku)?;
        self.items.insert(
            sku.to_string(),
            ItemEntry {
                qty,
                price,
                changed: true,
            },
        );
        Ok(())
    }

    /// Update the quantity of an existing item and mark it changed.
    ///
    /// Unknown SKUs are rejected: accepting them would create an item row
    /// with no price, which the store cannot represent.
    pub fn set_quantity(&mut self, sku: &str, qty: u64) -> DomainResult<()> {
        let entry = self.items.get_mut(sku).ok_or(DomainError::NotFound)?;
        entry.qty = qty;
        entry.changed = true;
        Ok(())
    }

    /// True iff the cart holds no items, persisted or not.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items mutated since load, i.e. the delta a write must flush.
    pub fn changed_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .filter(|(_, entry)| entry.changed)
            .map(|(sku, entry)| LineItem {
                sku: sku.clone(),
                qty: entry.qty,
                price: entry.price,
            })
            .collect()
    }

    /// All items, changed or not, in SKU order.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|(sku, entry)| LineItem {
                sku: sku.clone(),
                qty: entry.qty,
                price: entry.price,
            })
            .collect()
    }

    /// Sum of `qty * price` over all items. Derived, never stored.
    pub fn total(&self) -> u64 {
        self.items
            .values()
            .map(|entry| entry.qty * entry.price)
            .sum()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateRoot for Cart {
    type Id = CartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }
}

fn validate_sku(sku: &str) -> DomainResult<()> {
    if sku.is_empty() {
        return Err(DomainError::validation("sku must not be empty"));
    }
    if sku.starts_with(RESERVED_SKU_PREFIX) {
        return Err(DomainError::validation(format!(
            "sku must not use the reserved '{RESERVED_SKU_PREFIX}' prefix"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn a_fresh_cart_is_empty_and_unpersisted() {
        let cart = Cart::new();
        assert_eq!(cart.version(), Version::Empty);
        assert!(cart.is_empty());
    }

    #[test]
    fn a_fresh_cart_has_a_generated_id() {
        let cart = Cart::new();
        assert!(!cart.id().as_str().is_empty());
    }

    #[test]
    fn adding_an_item_marks_it_changed() {
        let mut cart = Cart::new();
        cart.add_item("apples", 5, 20).unwrap();

        let changed = cart.changed_items();
        assert_eq!(changed.len(), 1);
        assert_eq!(
            changed[0],
            LineItem {
                sku: "apples".to_string(),
                qty: 5,
                price: 20,
            }
        );
        assert_eq!(cart.total(), 100);
    }

    #[test]
    fn re_adding_a_sku_replaces_its_entry() {
        let mut cart = Cart::new();
        cart.add_item("apples", 5, 20).unwrap();
        cart.add_item("apples", 2, 30).unwrap();

        let changed = cart.changed_items();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].qty, 2);
        assert_eq!(changed[0].price, 30);
    }

    #[test]
    fn set_quantity_updates_an_existing_item() {
        let mut cart = Cart::new();
        cart.add_item("bananas", 2, 16).unwrap();
        cart.set_quantity("bananas", 4).unwrap();

        let changed = cart.changed_items();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].qty, 4);
    }

    #[test]
    fn set_quantity_rejects_an_unknown_sku() {
        let mut cart = Cart::new();
        let err = cart.set_quantity("bananas", 4).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn empty_and_reserved_skus_are_rejected() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_item("", 1, 1),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            cart.add_item("__cart", 1, 1),
            Err(DomainError::Validation(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn hydrated_items_start_unchanged() {
        let id: CartId = "123".parse().unwrap();
        let cart = Cart::hydrate(
            id,
            Version::Committed(0),
            vec![LineItem {
                sku: "carrots".to_string(),
                qty: 4,
                price: 8,
            }],
        );

        assert!(cart.changed_items().is_empty());
        assert_eq!(cart.line_items().len(), 1);
        assert_eq!(cart.total(), 32);
        assert_eq!(cart.version(), Version::Committed(0));
    }

    #[test]
    fn mutating_a_hydrated_item_puts_it_back_in_the_delta() {
        let id: CartId = "123".parse().unwrap();
        let mut cart = Cart::hydrate(
            id,
            Version::Committed(0),
            vec![LineItem {
                sku: "carrots".to_string(),
                qty: 4,
                price: 8,
            }],
        );
        cart.set_quantity("carrots", 6).unwrap();

        let changed = cart.changed_items();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].qty, 6);
    }

    #[test]
    fn cart_id_rejects_the_empty_string() {
        assert!(matches!(
            "".parse::<CartId>(),
            Err(DomainError::InvalidId(_))
        ));
    }

    fn sku_strategy() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: For any sequence of add_item calls, changed_items holds
        /// exactly one entry per distinct SKU, reflecting the latest call.
        #[test]
        fn changed_items_holds_one_entry_per_sku(
            ops in prop::collection::vec((sku_strategy(), 0u64..1_000, 0u64..1_000), 1..32)
        ) {
            let mut cart = Cart::new();
            let mut latest: BTreeMap<String, (u64, u64)> = BTreeMap::new();

            for (sku, qty, price) in &ops {
                cart.add_item(sku, *qty, *price).unwrap();
                latest.insert(sku.clone(), (*qty, *price));
            }

            let changed = cart.changed_items();
            prop_assert_eq!(changed.len(), latest.len());
            for item in &changed {
                let (qty, price) = latest[&item.sku];
                prop_assert_eq!(item.qty, qty);
                prop_assert_eq!(item.price, price);
            }
        }

        /// Property: total always equals the sum of qty * price over the full
        /// item mapping, independent of change flags.
        #[test]
        fn total_is_the_sum_over_all_items(
            ops in prop::collection::vec((sku_strategy(), 0u64..1_000, 0u64..1_000), 1..32)
        ) {
            let mut cart = Cart::new();
            for (sku, qty, price) in &ops {
                cart.add_item(sku, *qty, *price).unwrap();
            }

            let expected: u64 = cart
                .line_items()
                .iter()
                .map(|item| item.qty * item.price)
                .sum();
            prop_assert_eq!(cart.total(), expected);
        }
    }
}
