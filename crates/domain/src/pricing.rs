//! Pricing rules shared by cart and order total computation.

use crate::money::Money;

/// Subtotals at or above this amount ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_rupees(1_000);

/// Flat fee for standard shipping below the free-shipping threshold.
pub const STANDARD_SHIPPING_FEE: Money = Money::from_rupees(50);

/// Flat fee for express shipping below the free-shipping threshold.
pub const EXPRESS_SHIPPING_FEE: Money = Money::from_rupees(100);

/// Flat fee for priority shipping below the free-shipping threshold.
pub const PRIORITY_SHIPPING_FEE: Money = Money::from_rupees(150);

/// Tax rate applied to (subtotal - discount), in percent.
pub const TAX_RATE_PERCENT: u32 = 10;

/// Maximum order total accepted for cash-on-delivery.
pub const COD_CEILING: Money = Money::from_rupees(50_000);

/// Shipping charge for a given subtotal and flat fee.
pub fn shipping_charge(subtotal: Money, flat_fee: Money) -> Money {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        Money::zero()
    } else {
        flat_fee
    }
}
