//! Repositories translating aggregates to and from store operations.

pub mod cart;

pub use cart::{CartRepository, RepositoryError, deserialize, serialize};
