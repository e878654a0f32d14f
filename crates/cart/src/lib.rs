//! `cartstore-cart` — the shopping-cart aggregate.
//!
//! Pure domain state with change tracking; persistence lives in
//! `cartstore-infra`.

pub mod cart;

pub use cart::{Cart, CartId, LineItem, RESERVED_SKU_PREFIX};
