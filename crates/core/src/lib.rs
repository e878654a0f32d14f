//! `cartstore-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;

pub use aggregate::{AggregateRoot, Version};
pub use error::{DomainError, DomainResult};
