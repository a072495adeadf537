//! Shared types for the storefront core.

mod identity;
mod types;

pub use identity::{Identity, Role};
pub use types::{OrderId, ProductId, ReviewId, UserId};
