//! Wishlist operations.

use std::sync::Arc;

use common::{ProductId, UserId};
use domain::{NotificationPrefs, Wishlist};
use store::DocumentStore;

use crate::error::{Result, ServiceError};

#[derive(Clone)]
pub struct WishlistService {
    store: Arc<dyn DocumentStore>,
}

impl WishlistService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The user's wishlist, or a fresh empty one.
    pub async fn get_or_create(&self, user: UserId) -> Result<Wishlist> {
        Ok(self
            .store
            .get_wishlist(user)
            .await?
            .unwrap_or_else(|| Wishlist::new(user)))
    }

    /// Adds a product. Adding one that is already listed is a no-op.
    pub async fn add_product(&self, user: UserId, product_id: ProductId) -> Result<Wishlist> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(ServiceError::NotFound { entity: "product" });
        }

        let mut wishlist = self.get_or_create(user).await?;
        if wishlist.add_product(product_id) {
            self.store.save_wishlist(&wishlist).await?;
        }
        Ok(wishlist)
    }

    /// Removes a product. Idempotent.
    pub async fn remove_product(&self, user: UserId, product_id: ProductId) -> Result<Wishlist> {
        let mut wishlist = self.get_or_create(user).await?;
        if wishlist.remove_product(product_id) {
            self.store.save_wishlist(&wishlist).await?;
        }
        Ok(wishlist)
    }

    /// Updates notification flags for a listed product.
    pub async fn set_notifications(
        &self,
        user: UserId,
        product_id: ProductId,
        prefs: NotificationPrefs,
    ) -> Result<Wishlist> {
        let mut wishlist = self.get_or_create(user).await?;
        if !wishlist.set_notifications(product_id, prefs) {
            return Err(ServiceError::NotFound {
                entity: "wishlist entry",
            });
        }
        self.store.save_wishlist(&wishlist).await?;
        Ok(wishlist)
    }
}
