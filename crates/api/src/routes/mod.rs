//! Route handlers, grouped by resource.

pub mod carts;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod wishlist;

use serde::{Deserialize, Serialize};
use store::Page;

/// Common `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn to_page(self) -> Page {
        Page::new(self.page.unwrap_or(1), self.limit.unwrap_or(10))
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
        }
    }
}
