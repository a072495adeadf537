//! Domain layer for the storefront core.
//!
//! This crate provides the pure aggregates and value objects:
//! - `Money` and the pricing constants
//! - `Product` with its inventory and rating summary
//! - `Cart` with snapshot pricing and summary recomputation
//! - `Order` with the status state machine and COD payment sub-state
//! - `Review` and `Wishlist`
//!
//! Nothing here performs I/O; persistence and orchestration live in the
//! `store` and `services` crates.

pub mod cart;
pub mod money;
pub mod order;
pub mod pricing;
pub mod product;
pub mod review;
pub mod wishlist;

pub use cart::{AppliedCoupon, Cart, CartError, CartItem, CartSummary};
pub use money::Money;
pub use order::{
    Address, BillingInfo, Channel, CodDetails, CollectionAttempt, CollectionAttemptStatus,
    DeliveryAttempt, DeliveryAttemptStatus, Order, OrderError, OrderItem, OrderMetadata,
    OrderStatus, OrderSummary, PaymentInfo, PaymentMethod, PaymentStatus, ShippingInfo,
    ShippingMethod,
};
pub use product::{Inventory, PriceInfo, PriceSnapshot, Product, ProductError, RatingSummary};
pub use review::{HelpfulVotes, Review, ReviewEdit, ReviewImage, ReviewStatus};
pub use wishlist::{NotificationPrefs, Wishlist, WishlistEntry};
