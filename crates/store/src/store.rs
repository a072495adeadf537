use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReviewId, UserId};
use domain::{Cart, Order, OrderStatus, Product, RatingSummary, Review, ReviewStatus, Wishlist};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Pagination window, 1-based.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Filter for order listings.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user: Option<UserId>,
    pub status: Option<OrderStatus>,
}

/// Filter for review listings.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub product: Option<ProductId>,
    pub user: Option<UserId>,
    pub status: Option<ReviewStatus>,
    pub rating: Option<u8>,
    pub verified_only: bool,
}

/// One stock decrement applied inside an order commit.
#[derive(Debug, Clone, Copy)]
pub struct StockDecrement {
    pub product: ProductId,
    pub quantity: u32,
}

/// A signup awaiting email verification, keyed by address with a TTL.
///
/// Durable replacement for keeping pre-verification registrations in process
/// memory: records survive restarts and expire server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSignup {
    pub email: String,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Single-document
/// writes are atomic; `commit_order` is atomic across the order insert and
/// every stock decrement.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // -- Products --

    async fn insert_product(&self, product: &Product) -> Result<()>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Replaces a product document. Inventory fields must not be changed this
    /// way; all stock mutation goes through [`DocumentStore::adjust_stock`].
    async fn update_product(&self, product: &Product) -> Result<()>;

    /// Lists published products, newest first.
    async fn list_products(&self, page: Page) -> Result<Vec<Product>>;

    async fn product_exists_with_slug(&self, slug: &str) -> Result<bool>;

    /// Atomically applies `quantity += delta` to a product's inventory.
    ///
    /// Fails with [`StoreError::InsufficientStock`] if the result would be
    /// negative, leaving the document untouched. This call is safe under
    /// concurrent callers and is the sole inventory serialization point.
    /// Returns the updated product.
    ///
    /// [`StoreError::InsufficientStock`]: crate::StoreError::InsufficientStock
    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Product>;

    /// Overwrites a product's rating summary.
    async fn set_rating(&self, id: ProductId, rating: &RatingSummary) -> Result<()>;

    // -- Carts --

    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>>;

    /// Upserts a cart by owning user.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;

    // -- Orders --

    /// Persists a new order and applies its stock decrements as one atomic
    /// unit: either the order exists and every product was decremented, or
    /// nothing changed. Fails with [`StoreError::InsufficientStock`] if any
    /// decrement would go negative.
    ///
    /// [`StoreError::InsufficientStock`]: crate::StoreError::InsufficientStock
    async fn commit_order(&self, order: &Order, decrements: &[StockDecrement]) -> Result<()>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    async fn update_order(&self, order: &Order) -> Result<()>;

    /// Lists orders matching the filter, newest first.
    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>>;

    async fn count_orders(&self, filter: &OrderFilter) -> Result<u64>;

    /// Finds any delivered order of this user containing the product
    /// (purchase proof for reviews).
    async fn find_delivered_order(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<Order>>;

    // -- Reviews --

    /// Inserts a review. The unique (user, product) index rejects a second
    /// review for the same pair with [`StoreError::Duplicate`].
    ///
    /// [`StoreError::Duplicate`]: crate::StoreError::Duplicate
    async fn insert_review(&self, review: &Review) -> Result<()>;

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>>;

    async fn update_review(&self, review: &Review) -> Result<()>;

    /// Deletes a review. Returns false if it did not exist.
    async fn delete_review(&self, id: ReviewId) -> Result<bool>;

    async fn find_review_by_user_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<Review>>;

    /// Lists reviews matching the filter, newest first.
    async fn list_reviews(&self, filter: &ReviewFilter, page: Page) -> Result<Vec<Review>>;

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64>;

    /// Star values of all approved reviews for a product.
    async fn approved_ratings(&self, product: ProductId) -> Result<Vec<u8>>;

    // -- Wishlists --

    async fn get_wishlist(&self, user: UserId) -> Result<Option<Wishlist>>;

    /// Upserts a wishlist by owning user.
    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()>;

    // -- Pending signups --

    /// Upserts a pending signup record by email.
    async fn put_pending_signup(&self, signup: &PendingSignup) -> Result<()>;

    /// Removes and returns the pending signup for an email, if present and
    /// unexpired. Expired records are treated as absent.
    async fn take_pending_signup(&self, email: &str) -> Result<Option<PendingSignup>>;

    /// Deletes expired pending signups, returning how many were removed.
    async fn purge_expired_signups(&self) -> Result<u64>;
}
