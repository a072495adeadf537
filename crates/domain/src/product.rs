//! Product document: pricing, inventory and the rating summary.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Errors raised by product-level operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A stock adjustment would drive the quantity negative.
    #[error("Insufficient stock for product {name}")]
    InsufficientStock { name: String },
}

/// Base price and discount for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub base: Money,
    /// Discount in percent, 0-100.
    pub discount_percent: u32,
}

impl PriceInfo {
    /// Per-unit discount amount derived from the percent.
    pub fn unit_discount(&self) -> Money {
        self.base.percent(self.discount_percent)
    }

    /// Price after discount.
    pub fn final_price(&self) -> Money {
        self.base - self.unit_discount()
    }
}

/// Price captured at the time an item enters a cart or order.
///
/// Immune to later product price changes. `discount` is the per-unit
/// discount amount, not a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub base_price: Money,
    pub discount: Money,
    pub final_price: Money,
}

/// Stock levels for a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub quantity: u32,
    pub in_stock: bool,
    /// Advisory only; decremented best-effort on sales, never read for
    /// availability decisions.
    pub reserved_quantity: u32,
}

/// Aggregated review ratings for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Average rating rounded to one decimal; 0 when there are no reviews.
    pub average: f64,
    pub count: u32,
    /// Count of reviews per star, index 0 = one star.
    pub distribution: [u32; 5],
}

impl RatingSummary {
    /// Aggregates a set of 1-5 star ratings.
    pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
        let mut distribution = [0u32; 5];
        let mut sum = 0u64;
        let mut count = 0u32;

        for rating in ratings {
            let rating = rating.clamp(1, 5);
            distribution[rating as usize - 1] += 1;
            sum += rating as u64;
            count += 1;
        }

        if count == 0 {
            return Self::default();
        }

        let average = (sum as f64 / count as f64 * 10.0).round() / 10.0;
        Self {
            average,
            count,
            distribution,
        }
    }
}

/// Lookup metadata for a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub slug: String,
    pub published: bool,
}

/// A catalog product.
///
/// Inventory invariants: `quantity >= 0` (enforced by [`Product::adjust_stock`]
/// rejecting adjustments that would go negative) and
/// `in_stock == (quantity > 0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: PriceInfo,
    pub inventory: Inventory,
    pub rating: RatingSummary,
    pub metadata: ProductMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with the given stock level.
    pub fn new(name: impl Into<String>, base_price: Money, quantity: u32) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name,
            brand: String::new(),
            description: String::new(),
            price: PriceInfo {
                base: base_price,
                discount_percent: 0,
            },
            inventory: Inventory {
                quantity,
                in_stock: quantity > 0,
                reserved_quantity: 0,
            },
            rating: RatingSummary::default(),
            metadata: ProductMetadata {
                slug,
                published: true,
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a stock adjustment, rejecting any that would go negative.
    ///
    /// Recomputes `in_stock` and, for sales (negative delta), decrements the
    /// advisory reserved quantity best-effort.
    pub fn adjust_stock(&mut self, delta: i64) -> Result<(), ProductError> {
        let new_quantity = self.inventory.quantity as i64 + delta;
        if new_quantity < 0 {
            return Err(ProductError::InsufficientStock {
                name: self.name.clone(),
            });
        }

        self.inventory.quantity = new_quantity as u32;
        self.inventory.in_stock = new_quantity > 0;

        if delta < 0 {
            let sold = delta.unsigned_abs().min(u32::MAX as u64) as u32;
            self.inventory.reserved_quantity = self.inventory.reserved_quantity.saturating_sub(sold);
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether the requested quantity can currently be fulfilled.
    pub fn is_available(&self, requested: u32) -> bool {
        self.inventory.in_stock && self.inventory.quantity >= requested
    }

    /// Captures the current pricing for a cart or order line.
    pub fn price_snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            base_price: self.price.base,
            discount: self.price.unit_discount(),
            final_price: self.price.final_price(),
        }
    }
}

/// URL-safe slug from a product name.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: u32) -> Product {
        Product::new("City Cruiser", Money::from_rupees(500), quantity)
    }

    #[test]
    fn adjust_stock_decrements_and_recomputes_in_stock() {
        let mut p = product(10);
        p.adjust_stock(-4).unwrap();
        assert_eq!(p.inventory.quantity, 6);
        assert!(p.inventory.in_stock);

        p.adjust_stock(-6).unwrap();
        assert_eq!(p.inventory.quantity, 0);
        assert!(!p.inventory.in_stock);
    }

    #[test]
    fn adjust_stock_rejects_negative_result() {
        let mut p = product(3);
        let err = p.adjust_stock(-4).unwrap_err();
        assert!(matches!(err, ProductError::InsufficientStock { .. }));
        // No partial write
        assert_eq!(p.inventory.quantity, 3);
        assert!(p.inventory.in_stock);
    }

    #[test]
    fn adjust_stock_restock_flips_in_stock() {
        let mut p = product(0);
        assert!(!p.inventory.in_stock);
        p.adjust_stock(2).unwrap();
        assert!(p.inventory.in_stock);
        assert_eq!(p.inventory.quantity, 2);
    }

    #[test]
    fn sale_decrements_reserved_best_effort() {
        let mut p = product(10);
        p.inventory.reserved_quantity = 3;

        p.adjust_stock(-5).unwrap();
        assert_eq!(p.inventory.reserved_quantity, 0);

        // Restocks do not touch the reservation
        p.adjust_stock(5).unwrap();
        assert_eq!(p.inventory.reserved_quantity, 0);
    }

    #[test]
    fn availability() {
        let p = product(5);
        assert!(p.is_available(5));
        assert!(!p.is_available(6));
        assert!(!product(0).is_available(1));
    }

    #[test]
    fn price_snapshot_applies_discount() {
        let mut p = product(1);
        p.price.discount_percent = 20;
        let snap = p.price_snapshot();
        assert_eq!(snap.base_price, Money::from_rupees(500));
        assert_eq!(snap.discount, Money::from_rupees(100));
        assert_eq!(snap.final_price, Money::from_rupees(400));
    }

    #[test]
    fn rating_summary_rounds_to_one_decimal() {
        let summary = RatingSummary::from_ratings([5, 4, 4]);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.distribution, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn rating_summary_empty_resets_to_zero() {
        let summary = RatingSummary::from_ratings([]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.distribution, [0; 5]);
    }

    #[test]
    fn slugify_names() {
        assert_eq!(slugify("City Cruiser 29\""), "city-cruiser-29");
        assert_eq!(slugify("Trail-Blazer  X1"), "trail-blazer-x1");
    }
}
