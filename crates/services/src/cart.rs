//! Cart operations. Each call loads the user's cart (creating it lazily),
//! mutates through the aggregate and persists the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{ProductId, UserId};
use domain::{AppliedCoupon, Cart};
use store::DocumentStore;

use crate::error::{Result, ServiceError};

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn DocumentStore>,
}

impl CartService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The user's cart, or a fresh empty one.
    pub async fn get_or_create(&self, user: UserId) -> Result<Cart> {
        Ok(self
            .store
            .get_cart(user)
            .await?
            .unwrap_or_else(|| Cart::new(user)))
    }

    /// Adds a product line, merging with an existing line for the same
    /// product.
    #[tracing::instrument(skip(self, specs))]
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
        specs: BTreeMap<String, String>,
    ) -> Result<Cart> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "product" })?;

        let mut cart = self.get_or_create(user).await?;
        cart.add_item(&product, quantity, specs)?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Overwrites a line's quantity; 0 removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "product" })?;

        let mut cart = self.get_or_create(user).await?;
        cart.update_item_quantity(&product, quantity)?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Removes a line. Idempotent.
    pub async fn remove_item(&self, user: UserId, product_id: ProductId) -> Result<Cart> {
        let mut cart = self.get_or_create(user).await?;
        cart.remove_item(product_id);
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Empties the cart and drops any coupon.
    pub async fn clear(&self, user: UserId) -> Result<Cart> {
        let mut cart = self.get_or_create(user).await?;
        cart.clear();
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn apply_coupon(&self, user: UserId, coupon: AppliedCoupon) -> Result<Cart> {
        let mut cart = self.get_or_create(user).await?;
        cart.apply_coupon(coupon)?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn remove_coupon(&self, user: UserId) -> Result<Cart> {
        let mut cart = self.get_or_create(user).await?;
        cart.remove_coupon();
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }
}
