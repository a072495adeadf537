//! The order aggregate.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::pricing;

use super::status::OrderStatus;
use super::types::{
    Address, BillingInfo, CodDetails, CollectionAttempt, CollectionAttemptStatus, DeliveryAttempt,
    DeliveryAttemptStatus, OrderItem, OrderMetadata, OrderSummary, PaymentInfo, PaymentMethod,
    PaymentStatus, ShippingInfo, ShippingMethod,
};
use super::OrderError;

/// Delivery is abandoned and the order auto-cancelled after this many failed
/// attempts.
pub const MAX_DELIVERY_ATTEMPTS: usize = 3;

/// An order: an immutable snapshot of purchased items plus mutable status,
/// payment and shipping sub-state.
///
/// The item list and its price snapshots never change after creation. Status
/// changes are constrained by [`OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment: PaymentInfo,
    pub billing: BillingInfo,
    pub shipping: ShippingInfo,
    pub summary: OrderSummary,
    pub notes: Option<String>,
    pub metadata: OrderMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new `pending` order from snapshotted cart lines.
    ///
    /// Generates the COD verification code, computes totals and enforces the
    /// cash-on-delivery ceiling. No persistence happens here.
    pub fn place(
        user: UserId,
        items: Vec<OrderItem>,
        billing: BillingInfo,
        shipping_address: Address,
        shipping_method: ShippingMethod,
        metadata: OrderMetadata,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product,
                    quantity: item.quantity,
                });
            }
        }

        let now = Utc::now();
        let mut order = Self {
            id: OrderId::new(),
            user,
            items,
            status: OrderStatus::Pending,
            payment: PaymentInfo {
                method: PaymentMethod::Cod,
                status: PaymentStatus::CodPending,
                cod: CodDetails {
                    verification_code: generate_verification_code(),
                    collection_date: None,
                    collected_by: None,
                    attempts: Vec::new(),
                },
            },
            billing,
            shipping: ShippingInfo::new(shipping_address, shipping_method),
            summary: OrderSummary::default(),
            notes: None,
            metadata,
            created_at: now,
            updated_at: now,
        };

        order.calculate_totals();
        order.enforce_cod_ceiling()?;
        Ok(order)
    }

    /// Recomputes the summary from the immutable item snapshots.
    pub fn calculate_totals(&mut self) {
        let subtotal: Money = self
            .items
            .iter()
            .map(|item| item.price.base_price.multiply(item.quantity))
            .sum();
        let discount: Money = self
            .items
            .iter()
            .map(|item| item.price.discount.multiply(item.quantity))
            .sum();

        let shipping = pricing::shipping_charge(subtotal, self.shipping.method.flat_fee());
        let tax = (subtotal - discount).percent(pricing::TAX_RATE_PERCENT);

        self.summary = OrderSummary {
            subtotal,
            shipping,
            tax,
            discount,
            total: subtotal - discount + shipping + tax,
        };
    }

    /// Rejects orders whose total exceeds the COD ceiling.
    pub fn enforce_cod_ceiling(&self) -> Result<(), OrderError> {
        if self.summary.total > pricing::COD_CEILING {
            return Err(OrderError::LimitExceeded {
                total: self.summary.total,
                limit: pricing::COD_CEILING,
            });
        }
        Ok(())
    }

    /// Applies a status change, enforcing the transition table.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transitions to `shipped`. A tracking number must either be supplied or
    /// already be present.
    pub fn mark_shipped(
        &mut self,
        tracking_number: Option<String>,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<(), OrderError> {
        if tracking_number.is_none() && self.shipping.tracking_number.is_none() {
            return Err(OrderError::TrackingNumberRequired);
        }
        self.transition_to(OrderStatus::Shipped)?;
        if tracking_number.is_some() {
            self.shipping.tracking_number = tracking_number;
        }
        if estimated_delivery.is_some() {
            self.shipping.estimated_delivery = estimated_delivery;
        }
        Ok(())
    }

    /// Transitions to `delivered` and marks the cash as collected.
    pub fn mark_delivered(&mut self, collected_by: Option<UserId>) -> Result<(), OrderError> {
        self.transition_to(OrderStatus::Delivered)?;
        let now = Utc::now();
        self.payment.status = PaymentStatus::CodCollected;
        self.payment.cod.collection_date = Some(now);
        self.payment.cod.collected_by = collected_by;
        self.payment.cod.attempts.push(CollectionAttempt {
            date: now,
            status: CollectionAttemptStatus::Success,
            reason: String::new(),
        });
        Ok(())
    }

    /// Confirms a physical handoff with the COD verification code.
    ///
    /// A mismatched code records a failed collection attempt and leaves the
    /// order status untouched.
    pub fn confirm_delivery(&mut self, code: &str, collected_by: UserId) -> Result<(), OrderError> {
        if self.payment.cod.verification_code != code {
            self.payment.cod.attempts.push(CollectionAttempt {
                date: Utc::now(),
                status: CollectionAttemptStatus::Failed,
                reason: "verification code mismatch".to_string(),
            });
            return Err(OrderError::InvalidVerificationCode);
        }
        self.mark_delivered(Some(collected_by))
    }

    /// Transitions to `cancelled` and voids the pending payment.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition_to(OrderStatus::Cancelled)?;
        self.payment.status = PaymentStatus::Cancelled;
        Ok(())
    }

    /// Appends to the delivery attempt history.
    pub fn record_delivery_attempt(&mut self, status: DeliveryAttemptStatus, notes: String) {
        self.shipping.delivery_attempts.push(DeliveryAttempt {
            date: Utc::now(),
            status,
            notes,
        });
        self.updated_at = Utc::now();
    }

    /// Whether the failed-attempt budget is exhausted.
    pub fn delivery_abandoned(&self) -> bool {
        self.shipping.failed_attempts() >= MAX_DELIVERY_ATTEMPTS
    }

    /// Whether the given user owns this order.
    pub fn owned_by(&self, user: UserId) -> bool {
        self.user == user
    }
}

/// Six uppercase base-36 characters, drawn from UUID randomness.
fn generate_verification_code() -> String {
    const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(6)
        .map(|b| ALPHABET[(b % 36) as usize] as char)
        .collect()
}
