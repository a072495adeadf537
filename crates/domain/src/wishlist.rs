//! Per-user wishlists.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Per-product notification preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub price_drops: bool,
    pub back_in_stock: bool,
}

/// One saved product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product: ProductId,
    pub added_at: DateTime<Utc>,
    pub notify: NotificationPrefs,
}

/// A user's wishlist: an ordered set of products, no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wishlist {
    pub user: UserId,
    pub products: Vec<WishlistEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(user: UserId) -> Self {
        let now = Utc::now();
        Self {
            user,
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.products.iter().any(|e| e.product == product_id)
    }

    /// Adds a product. Returns false if it was already present.
    pub fn add_product(&mut self, product_id: ProductId) -> bool {
        if self.contains(product_id) {
            return false;
        }
        self.products.push(WishlistEntry {
            product: product_id,
            added_at: Utc::now(),
            notify: NotificationPrefs::default(),
        });
        self.updated_at = Utc::now();
        true
    }

    /// Removes a product. Returns false if it was not present.
    pub fn remove_product(&mut self, product_id: ProductId) -> bool {
        let before = self.products.len();
        self.products.retain(|e| e.product != product_id);
        let removed = self.products.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Updates notification flags for a saved product. Returns false if the
    /// product is not on the list.
    pub fn set_notifications(&mut self, product_id: ProductId, prefs: NotificationPrefs) -> bool {
        match self.products.iter_mut().find(|e| e.product == product_id) {
            Some(entry) => {
                entry.notify = prefs;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}
