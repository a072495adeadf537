//! Service error taxonomy.

use domain::{CartError, Money, OrderError, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requested quantity exceeds current stock.
    #[error("Not enough stock available for {name}")]
    InsufficientStock { name: String },

    /// A cart line can no longer be fulfilled at placement time.
    #[error("Stock is no longer available for {name}")]
    StockUnavailable { name: String },

    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid verification code")]
    InvalidVerificationCode,

    /// Cash-on-delivery ceiling breached.
    #[error("Order total {total} exceeds the cash-on-delivery limit {limit}")]
    LimitExceeded { total: Money, limit: Money },

    #[error("A review for this product already exists")]
    DuplicateReview,

    /// Reviews require a delivered order containing the product.
    #[error("Product was not purchased by this user")]
    NotPurchased,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Access denied")]
    Forbidden,

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => ServiceError::NotFound { entity },
            StoreError::InsufficientStock { name } => ServiceError::InsufficientStock { name },
            StoreError::Duplicate { ref constraint }
                if constraint == "reviews_user_product_unique" =>
            {
                ServiceError::DuplicateReview
            }
            StoreError::Duplicate { constraint } => {
                ServiceError::Validation(format!("duplicate value for {constraint}"))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { from, to } => {
                ServiceError::InvalidTransition { from, to }
            }
            OrderError::TrackingNumberRequired => {
                ServiceError::Validation("tracking number is required to ship".to_string())
            }
            OrderError::InvalidVerificationCode => ServiceError::InvalidVerificationCode,
            OrderError::LimitExceeded { total, limit } => {
                ServiceError::LimitExceeded { total, limit }
            }
            OrderError::NoItems => ServiceError::EmptyCart,
            OrderError::InvalidQuantity { .. } => {
                ServiceError::Validation(err.to_string())
            }
        }
    }
}

impl From<CartError> for ServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity { .. } | CartError::CouponExpired { .. } => {
                ServiceError::Validation(err.to_string())
            }
            CartError::ItemNotFound { .. } => ServiceError::NotFound {
                entity: "cart item",
            },
            CartError::InsufficientStock { name } => ServiceError::InsufficientStock { name },
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_unique_violation_maps_to_duplicate_review() {
        let err = ServiceError::from(StoreError::Duplicate {
            constraint: "reviews_user_product_unique".to_string(),
        });
        assert!(matches!(err, ServiceError::DuplicateReview));
    }

    #[test]
    fn store_not_found_keeps_entity() {
        let err = ServiceError::from(StoreError::NotFound { entity: "product" });
        assert!(matches!(err, ServiceError::NotFound { entity: "product" }));
    }
}
