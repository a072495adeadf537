//! Cart aggregate with snapshot pricing and derived totals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::pricing;
use crate::product::{PriceSnapshot, Product};

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The product is not in the cart.
    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: ProductId },

    /// Requested quantity exceeds available stock.
    #[error("Not enough stock available for {name}")]
    InsufficientStock { name: String },

    /// The coupon has already expired.
    #[error("Coupon {code} has expired")]
    CouponExpired { code: String },
}

/// One product line in a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductId,
    pub quantity: u32,
    pub selected_specs: BTreeMap<String, String>,
    pub price: PriceSnapshot,
    pub added_at: DateTime<Utc>,
}

/// Derived totals, recomputed before every persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// A percentage coupon applied to the whole cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_percentage: u32,
    pub expires_at: DateTime<Utc>,
}

impl AppliedCoupon {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartMetadata {
    pub item_count: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A user's cart. One per user, created lazily on first add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user: UserId,
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
    pub applied_coupon: Option<AppliedCoupon>,
    pub metadata: CartMetadata,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            items: Vec::new(),
            summary: CartSummary::default(),
            applied_coupon: None,
            metadata: CartMetadata::default(),
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product == product_id)
    }

    /// Adds a product line, merging with an existing line for the same
    /// product (quantities accumulate, specs shallow-merge with new keys
    /// winning). Prices are snapshotted from the product at add time.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: u32,
        specs: BTreeMap<String, String>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }
        if !product.is_available(quantity) {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
            });
        }

        match self.items.iter_mut().find(|item| item.product == product.id) {
            Some(existing) => {
                existing.quantity += quantity;
                existing.selected_specs.extend(specs);
            }
            None => self.items.push(CartItem {
                product: product.id,
                quantity,
                selected_specs: specs,
                price: product.price_snapshot(),
                added_at: Utc::now(),
            }),
        }

        self.recompute_summary();
        Ok(())
    }

    /// Overwrites a line's quantity after re-validating availability.
    /// Quantity 0 removes the line.
    pub fn update_item_quantity(
        &mut self,
        product: &Product,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove_item(product.id);
            return Ok(());
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.product == product.id)
            .ok_or(CartError::ItemNotFound {
                product_id: product.id,
            })?;

        if !product.is_available(quantity) {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
            });
        }

        item.quantity = quantity;
        self.recompute_summary();
        Ok(())
    }

    /// Removes a line. Idempotent.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product != product_id);
        self.recompute_summary();
    }

    /// Empties the cart and drops any applied coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.applied_coupon = None;
        self.recompute_summary();
    }

    /// Applies a coupon; expired coupons are rejected.
    pub fn apply_coupon(&mut self, coupon: AppliedCoupon) -> Result<(), CartError> {
        if coupon.is_expired(Utc::now()) {
            return Err(CartError::CouponExpired { code: coupon.code });
        }
        self.applied_coupon = Some(coupon);
        self.recompute_summary();
        Ok(())
    }

    pub fn remove_coupon(&mut self) {
        self.applied_coupon = None;
        self.recompute_summary();
    }

    /// Recomputes the derived summary from items and coupon.
    ///
    /// subtotal = Σ base × qty; discount = Σ line discount × qty, plus the
    /// coupon percentage of the subtotal when an unexpired coupon is applied;
    /// shipping is free at or above the threshold; tax is 10% of
    /// (subtotal - discount). Idempotent.
    pub fn recompute_summary(&mut self) {
        let subtotal: Money = self
            .items
            .iter()
            .map(|item| item.price.base_price.multiply(item.quantity))
            .sum();
        let mut discount: Money = self
            .items
            .iter()
            .map(|item| item.price.discount.multiply(item.quantity))
            .sum();

        if let Some(coupon) = &self.applied_coupon
            && !coupon.is_expired(Utc::now())
        {
            discount += subtotal.percent(coupon.discount_percentage);
        }

        let shipping = if self.items.is_empty() {
            Money::zero()
        } else {
            pricing::shipping_charge(subtotal, pricing::STANDARD_SHIPPING_FEE)
        };
        let tax = (subtotal - discount).percent(pricing::TAX_RATE_PERCENT);

        self.summary = CartSummary {
            subtotal,
            discount,
            shipping,
            tax,
            total: subtotal - discount + shipping + tax,
        };

        self.metadata.item_count = self.items.iter().map(|item| item.quantity).sum();
        self.metadata.last_updated = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(price_rupees: i64, quantity: u32) -> Product {
        Product::new("Roadster", Money::from_rupees(price_rupees), quantity)
    }

    #[test]
    fn add_item_snapshots_price() {
        let mut cart = Cart::new(UserId::new());
        let mut p = product(500, 10);
        p.price.discount_percent = 10;

        cart.add_item(&p, 2, BTreeMap::new()).unwrap();

        let item = cart.item(p.id).unwrap();
        assert_eq!(item.price.base_price, Money::from_rupees(500));
        assert_eq!(item.price.discount, Money::from_rupees(50));
        assert_eq!(item.price.final_price, Money::from_rupees(450));
    }

    #[test]
    fn add_item_merges_existing_line() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);

        let mut specs = BTreeMap::new();
        specs.insert("color".to_string(), "red".to_string());
        cart.add_item(&p, 2, specs).unwrap();

        let mut specs = BTreeMap::new();
        specs.insert("color".to_string(), "blue".to_string());
        specs.insert("frame_size".to_string(), "M".to_string());
        cart.add_item(&p, 1, specs).unwrap();

        assert_eq!(cart.items.len(), 1);
        let item = cart.item(p.id).unwrap();
        assert_eq!(item.quantity, 3);
        // New keys override on merge
        assert_eq!(item.selected_specs["color"], "blue");
        assert_eq!(item.selected_specs["frame_size"], "M");
    }

    #[test]
    fn add_item_rejects_zero_quantity_and_missing_stock() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 1);

        assert!(matches!(
            cart.add_item(&p, 0, BTreeMap::new()),
            Err(CartError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.add_item(&p, 2, BTreeMap::new()),
            Err(CartError::InsufficientStock { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_zero_removes() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        cart.add_item(&p, 2, BTreeMap::new()).unwrap();

        cart.update_item_quantity(&p, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_missing_item() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        assert!(matches!(
            cart.update_item_quantity(&p, 1),
            Err(CartError::ItemNotFound { .. })
        ));
    }

    #[test]
    fn remove_item_is_idempotent() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        cart.add_item(&p, 1, BTreeMap::new()).unwrap();

        cart.remove_item(p.id);
        cart.remove_item(p.id);
        assert!(cart.is_empty());
    }

    #[test]
    fn summary_worked_example() {
        // 2 × ₹500, no discount: subtotal 1000, free shipping, 10% tax
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        cart.add_item(&p, 2, BTreeMap::new()).unwrap();

        assert_eq!(cart.summary.subtotal, Money::from_rupees(1_000));
        assert_eq!(cart.summary.discount, Money::zero());
        assert_eq!(cart.summary.shipping, Money::zero());
        assert_eq!(cart.summary.tax, Money::from_rupees(100));
        assert_eq!(cart.summary.total, Money::from_rupees(1_100));
        assert_eq!(cart.metadata.item_count, 2);
    }

    #[test]
    fn summary_below_free_shipping_threshold() {
        let mut cart = Cart::new(UserId::new());
        let p = product(100, 10);
        cart.add_item(&p, 1, BTreeMap::new()).unwrap();

        assert_eq!(cart.summary.shipping, Money::from_rupees(50));
        // 100 - 0 + 50 + 10
        assert_eq!(cart.summary.total, Money::from_rupees(160));
    }

    #[test]
    fn recompute_summary_is_idempotent() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        cart.add_item(&p, 3, BTreeMap::new()).unwrap();

        cart.recompute_summary();
        let first = cart.summary.clone();
        cart.recompute_summary();
        assert_eq!(cart.summary, first);
    }

    #[test]
    fn coupon_discount_applies_until_expiry() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        cart.add_item(&p, 2, BTreeMap::new()).unwrap();

        cart.apply_coupon(AppliedCoupon {
            code: "SAVE10".to_string(),
            discount_percentage: 10,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .unwrap();

        // subtotal 1000, coupon 100, tax 10% of 900
        assert_eq!(cart.summary.discount, Money::from_rupees(100));
        assert_eq!(cart.summary.total, Money::from_rupees(990));
    }

    #[test]
    fn expired_coupon_is_rejected() {
        let mut cart = Cart::new(UserId::new());
        let err = cart
            .apply_coupon(AppliedCoupon {
                code: "OLD".to_string(),
                discount_percentage: 10,
                expires_at: Utc::now() - Duration::hours(1),
            })
            .unwrap_err();
        assert!(matches!(err, CartError::CouponExpired { .. }));
    }

    #[test]
    fn clear_drops_items_and_coupon() {
        let mut cart = Cart::new(UserId::new());
        let p = product(500, 10);
        cart.add_item(&p, 2, BTreeMap::new()).unwrap();
        cart.apply_coupon(AppliedCoupon {
            code: "SAVE10".to_string(),
            discount_percentage: 10,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .unwrap();

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.applied_coupon.is_none());
        assert_eq!(cart.summary.total, Money::zero());
        assert_eq!(cart.metadata.item_count, 0);
    }
}
