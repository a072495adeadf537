//! Value objects for the order domain.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing;
use crate::product::PriceSnapshot;

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

/// Billing details for an order. The phone number is required because
/// cash-on-delivery collection is coordinated by phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    pub address: Address,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// How an order is shipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Priority,
}

impl ShippingMethod {
    /// Flat fee charged below the free-shipping threshold.
    pub fn flat_fee(&self) -> Money {
        match self {
            ShippingMethod::Standard => pricing::STANDARD_SHIPPING_FEE,
            ShippingMethod::Express => pricing::EXPRESS_SHIPPING_FEE,
            ShippingMethod::Priority => pricing::PRIORITY_SHIPPING_FEE,
        }
    }
}

/// Outcome of one physical delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryAttemptStatus {
    Pending,
    Delivered,
    Failed,
    Rescheduled,
}

/// One entry in the delivery attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub date: DateTime<Utc>,
    pub status: DeliveryAttemptStatus,
    pub notes: String,
}

/// Shipping sub-state of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: Address,
    pub method: ShippingMethod,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivery_attempts: Vec<DeliveryAttempt>,
}

impl ShippingInfo {
    pub fn new(address: Address, method: ShippingMethod) -> Self {
        Self {
            address,
            method,
            tracking_number: None,
            estimated_delivery: None,
            delivery_attempts: Vec::new(),
        }
    }

    /// Number of failed delivery attempts accumulated so far.
    pub fn failed_attempts(&self) -> usize {
        self.delivery_attempts
            .iter()
            .filter(|a| a.status == DeliveryAttemptStatus::Failed)
            .count()
    }
}

/// Payment method. Only cash-on-delivery is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cod,
}

/// Payment sub-status for COD orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    CodPending,
    CodCollected,
    Cancelled,
}

/// Outcome of one cash-collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionAttemptStatus {
    Success,
    Failed,
    Rescheduled,
}

/// One entry in the cash-collection attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionAttempt {
    pub date: DateTime<Utc>,
    pub status: CollectionAttemptStatus,
    pub reason: String,
}

/// Cash-on-delivery collection details.
///
/// The verification code is generated once at order creation and never
/// changes; the delivery agent confirms it at handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodDetails {
    pub verification_code: String,
    pub collection_date: Option<DateTime<Utc>>,
    pub collected_by: Option<UserId>,
    pub attempts: Vec<CollectionAttempt>,
}

/// Payment sub-state of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub cod: CodDetails,
}

/// Immutable snapshot of one purchased line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub quantity: u32,
    pub price: PriceSnapshot,
    pub specifications: BTreeMap<String, String>,
}

/// Order totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

/// Originating channel for an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Website,
    MobileApp,
    InStore,
}

/// Request context captured when the order was placed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub source: Channel,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_fees_by_method() {
        assert_eq!(ShippingMethod::Standard.flat_fee(), Money::from_rupees(50));
        assert_eq!(ShippingMethod::Express.flat_fee(), Money::from_rupees(100));
        assert_eq!(ShippingMethod::Priority.flat_fee(), Money::from_rupees(150));
    }

    #[test]
    fn payment_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::CodPending).unwrap(),
            "\"cod_pending\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::CodCollected).unwrap(),
            "\"cod_collected\""
        );
    }

    #[test]
    fn failed_attempt_count() {
        let mut shipping = ShippingInfo::new(Address::default(), ShippingMethod::Standard);
        for status in [
            DeliveryAttemptStatus::Failed,
            DeliveryAttemptStatus::Rescheduled,
            DeliveryAttemptStatus::Failed,
        ] {
            shipping.delivery_attempts.push(DeliveryAttempt {
                date: Utc::now(),
                status,
                notes: String::new(),
            });
        }
        assert_eq!(shipping.failed_attempts(), 2);
    }
}
