//! Document store for the storefront core.
//!
//! Exposes the [`DocumentStore`] trait plus two implementations:
//! - [`InMemoryStore`] for tests and local development
//! - [`PostgresStore`] backed by JSONB documents with extracted index columns
//!
//! The store owns the two correctness-critical guarantees of the system:
//! `adjust_stock` is the single serialization point for inventory, and
//! `commit_order` persists an order and its stock decrements atomically.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{
    DocumentStore, OrderFilter, Page, PendingSignup, ReviewFilter, StockDecrement,
};
