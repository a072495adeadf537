//! Order aggregate and related types.

mod aggregate;
mod status;
mod types;

pub use aggregate::{MAX_DELIVERY_ATTEMPTS, Order};
pub use status::OrderStatus;
pub use types::{
    Address, BillingInfo, Channel, CodDetails, CollectionAttempt, CollectionAttemptStatus,
    DeliveryAttempt, DeliveryAttemptStatus, OrderItem, OrderMetadata, OrderSummary, PaymentInfo,
    PaymentMethod, PaymentStatus, ShippingInfo, ShippingMethod,
};

use common::ProductId;
use thiserror::Error;

use crate::money::Money;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not in the transition table.
    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Shipping an order requires a tracking number.
    #[error("Tracking number is required for shipped status")]
    TrackingNumberRequired,

    /// The supplied COD verification code does not match the order's code.
    #[error("Invalid verification code")]
    InvalidVerificationCode,

    /// The order total exceeds the cash-on-delivery ceiling.
    #[error("Order total {total} exceeds the {limit} limit for cash on delivery")]
    LimitExceeded { total: Money, limit: Money },

    /// An order must contain at least one item.
    #[error("Order has no items")]
    NoItems,

    /// Line item quantities must be at least 1.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },
}
