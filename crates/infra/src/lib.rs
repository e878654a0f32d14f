//! Infrastructure layer: store boundary, cart repository, telemetry.

pub mod repository;
pub mod store;
pub mod telemetry;


pub use repository::{CartRepository, RepositoryError};
pub use store::{InMemoryStore, StoreClient, StoreError};
