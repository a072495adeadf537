//! PostgreSQL-backed store. Documents live as JSONB with a few extracted
//! columns for lookups, filtering and uniqueness.

use async_trait::async_trait;
use common::{OrderId, ProductId, ReviewId, UserId};
use domain::{Cart, Order, OrderStatus, Product, RatingSummary, Review, Wishlist};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::error::{Result, StoreError};
use crate::store::{
    DocumentStore, OrderFilter, Page, PendingSignup, ReviewFilter, StockDecrement,
};

/// PostgreSQL [`DocumentStore`] implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Loads and row-locks a product inside a transaction.
    async fn lock_product(
        tx: &mut Transaction<'_, Postgres>,
        id: ProductId,
    ) -> Result<Product> {
        let row = sqlx::query("SELECT doc FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StoreError::NotFound { entity: "product" })?;
        doc_from_row(row)
    }

    /// Writes a product document and its extracted columns back.
    async fn write_product(
        tx: &mut Transaction<'_, Postgres>,
        product: &Product,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE products SET slug = $2, quantity = $3, published = $4, doc = $5 WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.metadata.slug)
        .bind(product.inventory.quantity as i64)
        .bind(product.metadata.published)
        .bind(serde_json::to_value(product)?)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

fn doc_from_row<T: serde::de::DeserializeOwned>(row: PgRow) -> Result<T> {
    let doc: serde_json::Value = row.try_get("doc")?;
    Ok(serde_json::from_value(doc)?)
}

fn map_unique_violation(err: sqlx::Error, constraint: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(constraint)
    {
        return StoreError::Duplicate {
            constraint: constraint.to_string(),
        };
    }
    StoreError::Database(err)
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, slug, quantity, published, created_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.metadata.slug)
        .bind(product.inventory.quantity as i64)
        .bind(product.metadata.published)
        .bind(product.created_at)
        .bind(serde_json::to_value(product)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "products_slug_unique"))?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        sqlx::query("SELECT doc FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(doc_from_row)
            .transpose()
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        // Take the row lock so a concurrent stock adjustment cannot be
        // overwritten by this document write.
        let current = Self::lock_product(&mut tx, product.id).await?;

        let mut updated = product.clone();
        updated.inventory = current.inventory;
        Self::write_product(&mut tx, &updated).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_products(&self, page: Page) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM products
            WHERE published
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(doc_from_row).collect()
    }

    async fn product_exists_with_slug(&self, slug: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Product> {
        let mut tx = self.pool.begin().await?;
        let mut product = Self::lock_product(&mut tx, id).await?;

        product
            .adjust_stock(delta)
            .map_err(|_| StoreError::InsufficientStock {
                name: product.name.clone(),
            })?;

        Self::write_product(&mut tx, &product).await?;
        tx.commit().await?;
        tracing::debug!(product_id = %product.id, delta, quantity = product.inventory.quantity, "stock adjusted");
        Ok(product)
    }

    async fn set_rating(&self, id: ProductId, rating: &RatingSummary) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let mut product = Self::lock_product(&mut tx, id).await?;
        product.rating = rating.clone();
        product.updated_at = chrono::Utc::now();
        Self::write_product(&mut tx, &product).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>> {
        sqlx::query("SELECT doc FROM carts WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(doc_from_row)
            .transpose()
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, doc) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(cart.user.as_uuid())
        .bind(serde_json::to_value(cart)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn commit_order(&self, order: &Order, decrements: &[StockDecrement]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Lock products in a stable order so two concurrent placements cannot
        // deadlock on each other.
        let mut decrements: Vec<StockDecrement> = decrements.to_vec();
        decrements.sort_by_key(|d| d.product);

        for dec in &decrements {
            let mut product = Self::lock_product(&mut tx, dec.product).await?;
            product
                .adjust_stock(-(dec.quantity as i64))
                .map_err(|_| StoreError::InsufficientStock {
                    name: product.name.clone(),
                })?;
            Self::write_product(&mut tx, &product).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, created_at, doc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user.as_uuid())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(serde_json::to_value(order)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(
            order_id = %order.id,
            decrements = decrements.len(),
            "order committed"
        );
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        sqlx::query("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(doc_from_row)
            .transpose()
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, doc = $3 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(order.status.as_str())
            .bind(serde_json::to_value(order)?)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "order" });
        }
        Ok(())
    }

    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.user.map(|u| u.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(doc_from_row).collect()
    }

    async fn count_orders(&self, filter: &OrderFilter) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(filter.user.map(|u| u.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn find_delivered_order(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<Order>> {
        sqlx::query(
            r#"
            SELECT doc FROM orders
            WHERE user_id = $1
              AND status = $2
              AND doc -> 'items' @> $3
            LIMIT 1
            "#,
        )
        .bind(user.as_uuid())
        .bind(OrderStatus::Delivered.as_str())
        .bind(serde_json::json!([{ "product": product }]))
        .fetch_optional(&self.pool)
        .await?
        .map(doc_from_row)
        .transpose()
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, product_id, status, rating, verified, created_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.user.as_uuid())
        .bind(review.product.as_uuid())
        .bind(review.status.as_str())
        .bind(review.rating as i16)
        .bind(review.verified)
        .bind(review.created_at)
        .bind(serde_json::to_value(review)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "reviews_user_product_unique"))?;
        Ok(())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        sqlx::query("SELECT doc FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(doc_from_row)
            .transpose()
    }

    async fn update_review(&self, review: &Review) -> Result<()> {
        let result =
            sqlx::query("UPDATE reviews SET status = $2, rating = $3, doc = $4 WHERE id = $1")
                .bind(review.id.as_uuid())
                .bind(review.status.as_str())
                .bind(review.rating as i16)
                .bind(serde_json::to_value(review)?)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "review" });
        }
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_review_by_user_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<Review>> {
        sqlx::query("SELECT doc FROM reviews WHERE user_id = $1 AND product_id = $2")
            .bind(user.as_uuid())
            .bind(product.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(doc_from_row)
            .transpose()
    }

    async fn list_reviews(&self, filter: &ReviewFilter, page: Page) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM reviews
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::smallint IS NULL OR rating = $4)
              AND (NOT $5 OR verified)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.product.map(|p| p.as_uuid()))
        .bind(filter.user.map(|u| u.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.rating.map(|r| r as i16))
        .bind(filter.verified_only)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(doc_from_row).collect()
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reviews
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::smallint IS NULL OR rating = $4)
              AND (NOT $5 OR verified)
            "#,
        )
        .bind(filter.product.map(|p| p.as_uuid()))
        .bind(filter.user.map(|u| u.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.rating.map(|r| r as i16))
        .bind(filter.verified_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn approved_ratings(&self, product: ProductId) -> Result<Vec<u8>> {
        let ratings: Vec<i16> = sqlx::query_scalar(
            "SELECT rating FROM reviews WHERE product_id = $1 AND status = 'approved'",
        )
        .bind(product.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings.into_iter().map(|r| r as u8).collect())
    }

    async fn get_wishlist(&self, user: UserId) -> Result<Option<Wishlist>> {
        sqlx::query("SELECT doc FROM wishlists WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(doc_from_row)
            .transpose()
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wishlists (user_id, doc) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(wishlist.user.as_uuid())
        .bind(serde_json::to_value(wishlist)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put_pending_signup(&self, signup: &PendingSignup) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pending_signups (email, payload, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
                SET payload = EXCLUDED.payload, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&signup.email)
        .bind(&signup.payload)
        .bind(signup.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_pending_signup(&self, email: &str) -> Result<Option<PendingSignup>> {
        let row = sqlx::query(
            r#"
            DELETE FROM pending_signups
            WHERE email = $1
            RETURNING email, payload, expires_at
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let signup = PendingSignup {
            email: row.try_get("email")?,
            payload: row.try_get("payload")?,
            expires_at: row.try_get("expires_at")?,
        };
        if signup.expires_at <= chrono::Utc::now() {
            return Ok(None);
        }
        Ok(Some(signup))
    }

    async fn purge_expired_signups(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pending_signups WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
