//! Inventory ledger: the single entry point for stock mutation.

use std::sync::Arc;

use common::ProductId;
use domain::Product;
use store::DocumentStore;

use crate::error::Result;

/// All stock changes flow through here (or through the order placement
/// transaction); nothing else touches `inventory.quantity`.
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn DocumentStore>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Applies `quantity += delta`, failing on a negative result rather than
    /// clamping. Returns the updated product.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<Product> {
        let product = self.store.adjust_stock(product_id, delta).await?;
        metrics::counter!("stock_adjustments_total").increment(1);
        Ok(product)
    }

    /// Read-only availability check. Advisory: the authoritative check is the
    /// conditional decrement inside the store.
    pub async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let product = self.store.get_product(product_id).await?;
        Ok(product.is_some_and(|p| p.is_available(quantity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use domain::Money;
    use store::{DocumentStore, InMemoryStore};

    async fn seeded(quantity: u32) -> (Arc<InMemoryStore>, InventoryLedger, Product) {
        let store = Arc::new(InMemoryStore::new());
        let ledger = InventoryLedger::new(store.clone());
        let product = Product::new("City Cruiser", Money::from_rupees(500), quantity);
        store.insert_product(&product).await.unwrap();
        (store, ledger, product)
    }

    #[tokio::test]
    async fn adjust_and_check() {
        let (_store, ledger, product) = seeded(5).await;

        let updated = ledger.adjust_stock(product.id, -3).await.unwrap();
        assert_eq!(updated.inventory.quantity, 2);

        assert!(ledger.check_availability(product.id, 2).await.unwrap());
        assert!(!ledger.check_availability(product.id, 3).await.unwrap());
        assert!(!ledger.check_availability(ProductId::new(), 1).await.unwrap());
    }

    #[tokio::test]
    async fn over_decrement_is_rejected() {
        let (_store, ledger, product) = seeded(1).await;
        let err = ledger.adjust_stock(product.id, -2).await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock { .. }));
    }
}
