//! In-memory store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, ReviewId, UserId};
use domain::{Cart, Order, OrderStatus, Product, RatingSummary, Review, Wishlist};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::{
    DocumentStore, OrderFilter, Page, PendingSignup, ReviewFilter, StockDecrement,
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    reviews: HashMap<ReviewId, Review>,
    wishlists: HashMap<UserId, Wishlist>,
    pending_signups: HashMap<String, PendingSignup>,
}

/// In-memory [`DocumentStore`] backed by a single lock.
///
/// Holding every collection under one `RwLock` makes multi-document writes
/// such as [`DocumentStore::commit_order`] trivially atomic.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn order_matches(order: &Order, filter: &OrderFilter) -> bool {
    filter.user.is_none_or(|u| order.user == u)
        && filter.status.is_none_or(|s| order.status == s)
}

fn review_matches(review: &Review, filter: &ReviewFilter) -> bool {
    filter.product.is_none_or(|p| review.product == p)
        && filter.user.is_none_or(|u| review.user == u)
        && filter.status.is_none_or(|s| review.status == s)
        && filter.rating.is_none_or(|r| review.rating == r)
        && (!filter.verified_only || review.verified)
}

fn paginate<T>(mut items: Vec<T>, page: Page) -> Vec<T> {
    let offset = page.offset() as usize;
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(..offset);
    items.truncate(page.limit as usize);
    items
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .products
            .values()
            .any(|p| p.metadata.slug == product.metadata.slug)
        {
            return Err(StoreError::Duplicate {
                constraint: "products_slug_unique".into(),
            });
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "product" }),
        }
    }

    async fn list_products(&self, page: Page) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.metadata.published)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(products, page))
    }

    async fn product_exists_with_slug(&self, slug: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.products.values().any(|p| p.metadata.slug == slug))
    }

    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "product" })?;
        product
            .adjust_stock(delta)
            .map_err(|_| StoreError::InsufficientStock {
                name: product.name.clone(),
            })?;
        Ok(product.clone())
    }

    async fn set_rating(&self, id: ProductId, rating: &RatingSummary) -> Result<()> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "product" })?;
        product.rating = rating.clone();
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&user).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.state.write().await.carts.insert(cart.user, cart.clone());
        Ok(())
    }

    async fn commit_order(&self, order: &Order, decrements: &[StockDecrement]) -> Result<()> {
        let mut state = self.state.write().await;

        // Verify every decrement before touching anything.
        for dec in decrements {
            let product = state
                .products
                .get(&dec.product)
                .ok_or(StoreError::NotFound { entity: "product" })?;
            if product.inventory.quantity < dec.quantity {
                return Err(StoreError::InsufficientStock {
                    name: product.name.clone(),
                });
            }
        }

        for dec in decrements {
            if let Some(product) = state.products.get_mut(&dec.product) {
                // Cannot fail: checked above under the same write lock.
                let _ = product.adjust_stock(-(dec.quantity as i64));
            }
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "order" }),
        }
    }

    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| order_matches(o, filter))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(orders, page))
    }

    async fn count_orders(&self, filter: &OrderFilter) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| order_matches(o, filter))
            .count() as u64)
    }

    async fn find_delivered_order(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|o| {
                o.user == user
                    && o.status == OrderStatus::Delivered
                    && o.items.iter().any(|item| item.product == product)
            })
            .cloned())
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .reviews
            .values()
            .any(|r| r.user == review.user && r.product == review.product)
        {
            return Err(StoreError::Duplicate {
                constraint: "reviews_user_product_unique".into(),
            });
        }
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.state.read().await.reviews.get(&id).cloned())
    }

    async fn update_review(&self, review: &Review) -> Result<()> {
        let mut state = self.state.write().await;
        match state.reviews.get_mut(&review.id) {
            Some(existing) => {
                *existing = review.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "review" }),
        }
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        Ok(self.state.write().await.reviews.remove(&id).is_some())
    }

    async fn find_review_by_user_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .find(|r| r.user == user && r.product == product)
            .cloned())
    }

    async fn list_reviews(&self, filter: &ReviewFilter, page: Page) -> Result<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| review_matches(r, filter))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(reviews, page))
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .filter(|r| review_matches(r, filter))
            .count() as u64)
    }

    async fn approved_ratings(&self, product: ProductId) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .filter(|r| r.product == product && r.is_approved())
            .map(|r| r.rating)
            .collect())
    }

    async fn get_wishlist(&self, user: UserId) -> Result<Option<Wishlist>> {
        Ok(self.state.read().await.wishlists.get(&user).cloned())
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        self.state
            .write()
            .await
            .wishlists
            .insert(wishlist.user, wishlist.clone());
        Ok(())
    }

    async fn put_pending_signup(&self, signup: &PendingSignup) -> Result<()> {
        self.state
            .write()
            .await
            .pending_signups
            .insert(signup.email.clone(), signup.clone());
        Ok(())
    }

    async fn take_pending_signup(&self, email: &str) -> Result<Option<PendingSignup>> {
        let mut state = self.state.write().await;
        match state.pending_signups.remove(email) {
            Some(signup) if signup.expires_at > Utc::now() => Ok(Some(signup)),
            _ => Ok(None),
        }
    }

    async fn purge_expired_signups(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let before = state.pending_signups.len();
        state.pending_signups.retain(|_, s| s.expires_at > now);
        Ok((before - state.pending_signups.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{
        Address, BillingInfo, Money, OrderItem, OrderMetadata, ShippingMethod,
    };
    use std::collections::BTreeMap;

    fn product(name: &str, quantity: u32) -> Product {
        Product::new(name, Money::from_rupees(500), quantity)
    }

    fn address() -> Address {
        Address {
            street: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "KA".into(),
            country: "IN".into(),
            zip_code: "560001".into(),
        }
    }

    fn billing() -> BillingInfo {
        BillingInfo {
            address: address(),
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
        }
    }

    fn order_for(p: &Product, quantity: u32) -> Order {
        Order::place(
            UserId::new(),
            vec![OrderItem {
                product: p.id,
                quantity,
                price: p.price_snapshot(),
                specifications: BTreeMap::new(),
            }],
            billing(),
            address(),
            ShippingMethod::Standard,
            OrderMetadata::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_product_rejects_duplicate_slug() {
        let store = InMemoryStore::new();
        store.insert_product(&product("Trail Blazer", 5)).await.unwrap();

        let err = store
            .insert_product(&product("Trail Blazer", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn adjust_stock_fails_without_partial_write() {
        let store = InMemoryStore::new();
        let p = product("City Cruiser", 3);
        store.insert_product(&p).await.unwrap();

        let err = store.adjust_stock(p.id, -4).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.inventory.quantity, 3);
    }

    #[tokio::test]
    async fn commit_order_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let available = product("Available", 10);
        let scarce = product("Scarce", 1);
        store.insert_product(&available).await.unwrap();
        store.insert_product(&scarce).await.unwrap();

        let order = order_for(&available, 2);
        let decrements = [
            StockDecrement {
                product: available.id,
                quantity: 2,
            },
            StockDecrement {
                product: scarce.id,
                quantity: 5,
            },
        ];

        let err = store.commit_order(&order, &decrements).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        // Nothing was decremented and the order does not exist.
        let stored = store.get_product(available.id).await.unwrap().unwrap();
        assert_eq!(stored.inventory.quantity, 10);
        assert!(store.get_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_order_applies_decrements() {
        let store = InMemoryStore::new();
        let p = product("City Cruiser", 10);
        store.insert_product(&p).await.unwrap();

        let order = order_for(&p, 3);
        store
            .commit_order(
                &order,
                &[StockDecrement {
                    product: p.id,
                    quantity: 3,
                }],
            )
            .await
            .unwrap();

        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.inventory.quantity, 7);
        assert!(store.get_order(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_orders_filters_by_user_and_status() {
        let store = InMemoryStore::new();
        let p = product("City Cruiser", 100);
        store.insert_product(&p).await.unwrap();

        let mine = order_for(&p, 1);
        let theirs = order_for(&p, 1);
        store.commit_order(&mine, &[]).await.unwrap();
        store.commit_order(&theirs, &[]).await.unwrap();

        let filter = OrderFilter {
            user: Some(mine.user),
            status: None,
        };
        let orders = store.list_orders(&filter, Page::default()).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, mine.id);
        assert_eq!(store.count_orders(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_review_for_same_pair_rejected() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product_id = ProductId::new();
        let review = Review::new(
            user,
            product_id,
            OrderId::new(),
            5,
            "Great".into(),
            "Rides well".into(),
            None,
            None,
        );
        store.insert_review(&review).await.unwrap();

        let second = Review::new(
            user,
            product_id,
            OrderId::new(),
            1,
            "Changed my mind".into(),
            "Actually no".into(),
            None,
            None,
        );
        let err = store.insert_review(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn approved_ratings_excludes_unapproved() {
        let store = InMemoryStore::new();
        let product_id = ProductId::new();

        let mut approved = Review::new(
            UserId::new(),
            product_id,
            OrderId::new(),
            4,
            "Good".into(),
            "Solid".into(),
            None,
            None,
        );
        approved.moderate(domain::ReviewStatus::Approved, None, UserId::new());
        store.insert_review(&approved).await.unwrap();

        let pending = Review::new(
            UserId::new(),
            product_id,
            OrderId::new(),
            1,
            "Meh".into(),
            "Still pending".into(),
            None,
            None,
        );
        store.insert_review(&pending).await.unwrap();

        assert_eq!(store.approved_ratings(product_id).await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn pending_signup_expires() {
        let store = InMemoryStore::new();
        store
            .put_pending_signup(&PendingSignup {
                email: "new@example.com".into(),
                payload: serde_json::json!({"name": "New User"}),
                expires_at: Utc::now() - Duration::minutes(1),
            })
            .await
            .unwrap();

        assert!(store.take_pending_signup("new@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_signup_take_is_one_shot() {
        let store = InMemoryStore::new();
        store
            .put_pending_signup(&PendingSignup {
                email: "new@example.com".into(),
                payload: serde_json::json!({}),
                expires_at: Utc::now() + Duration::hours(24),
            })
            .await
            .unwrap();

        assert!(store.take_pending_signup("new@example.com").await.unwrap().is_some());
        assert!(store.take_pending_signup("new@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_expired_signups_counts_removed() {
        let store = InMemoryStore::new();
        store
            .put_pending_signup(&PendingSignup {
                email: "stale@example.com".into(),
                payload: serde_json::json!({}),
                expires_at: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();
        store
            .put_pending_signup(&PendingSignup {
                email: "fresh@example.com".into(),
                payload: serde_json::json!({}),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();

        assert_eq!(store.purge_expired_signups().await.unwrap(), 1);
        assert!(store.take_pending_signup("fresh@example.com").await.unwrap().is_some());
    }
}
