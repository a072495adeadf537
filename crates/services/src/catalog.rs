//! Product read surface. Catalog authoring happens elsewhere; the core only
//! looks products up.

use std::sync::Arc;

use common::ProductId;
use domain::Product;
use store::{DocumentStore, Page};

use crate::error::{Result, ServiceError};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "product" })
    }

    /// Published products, newest first.
    pub async fn list_products(&self, page: Page) -> Result<Vec<Product>> {
        Ok(self.store.list_products(page).await?)
    }

    pub async fn exists_with_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.store.product_exists_with_slug(slug).await?)
    }
}
