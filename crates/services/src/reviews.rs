//! Reviews and the product rating aggregation they feed.

use std::sync::Arc;

use common::{Identity, ProductId, ReviewId, UserId};
use domain::{RatingSummary, Review, ReviewEdit, ReviewImage, ReviewStatus};
use store::{DocumentStore, Page, ReviewFilter};

use crate::error::{Result, ServiceError};

/// Input for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub rating: u8,
    pub title: String,
    pub content: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub images: Vec<ReviewImage>,
    pub device_info: Option<String>,
}

/// Filters on the public review listing for a product.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductReviewQuery {
    pub rating: Option<u8>,
    pub verified_only: bool,
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn DocumentStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a pending review. Requires a delivered order of this user
    /// containing the product, and no prior review for the pair.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_review(
        &self,
        user: UserId,
        product_id: ProductId,
        input: NewReview,
    ) -> Result<Review> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(ServiceError::NotFound { entity: "product" });
        }

        let order = self
            .store
            .find_delivered_order(user, product_id)
            .await?
            .ok_or(ServiceError::NotPurchased)?;

        let mut review = Review::new(
            user,
            product_id,
            order.id,
            input.rating,
            input.title,
            input.content,
            Some(order.created_at),
            input.device_info,
        );
        review.pros = input.pros;
        review.cons = input.cons;
        review.images = input.images;

        // The (user, product) unique index is the authority on duplicates.
        self.store.insert_review(&review).await?;
        metrics::counter!("reviews_created_total").increment(1);

        self.recompute_rating(product_id).await?;
        Ok(review)
    }

    /// Owner-only edit. Drops the review back to `pending` for re-moderation.
    #[tracing::instrument(skip(self, edit))]
    pub async fn update_review(
        &self,
        review_id: ReviewId,
        identity: Identity,
        edit: ReviewEdit,
    ) -> Result<Review> {
        let mut review = self.load(review_id).await?;
        if review.user != identity.user {
            return Err(ServiceError::Forbidden);
        }

        review.edit(edit);
        self.store.update_review(&review).await?;
        self.recompute_rating(review.product).await?;
        Ok(review)
    }

    /// Admin moderation decision.
    #[tracing::instrument(skip(self, comment))]
    pub async fn moderate_review(
        &self,
        review_id: ReviewId,
        identity: Identity,
        status: ReviewStatus,
        comment: Option<String>,
    ) -> Result<Review> {
        if !identity.is_admin() {
            return Err(ServiceError::Forbidden);
        }

        let mut review = self.load(review_id).await?;
        review.moderate(status, comment, identity.user);
        self.store.update_review(&review).await?;
        self.recompute_rating(review.product).await?;
        Ok(review)
    }

    /// Owner-or-admin delete.
    #[tracing::instrument(skip(self))]
    pub async fn delete_review(&self, review_id: ReviewId, identity: Identity) -> Result<()> {
        let review = self.load(review_id).await?;
        if !identity.can_access(review.user) {
            return Err(ServiceError::Forbidden);
        }

        self.store.delete_review(review_id).await?;
        self.recompute_rating(review.product).await?;
        Ok(())
    }

    /// Toggles the caller's helpful vote. Returns true if the vote is now set.
    pub async fn mark_helpful(&self, review_id: ReviewId, user: UserId) -> Result<bool> {
        let mut review = self.load(review_id).await?;
        let voted = review.toggle_helpful(user);
        self.store.update_review(&review).await?;
        Ok(voted)
    }

    /// Public listing: approved reviews of a product, optionally narrowed by
    /// star rating or verified purchases.
    pub async fn list_product_reviews(
        &self,
        product_id: ProductId,
        query: ProductReviewQuery,
        page: Page,
    ) -> Result<(Vec<Review>, u64)> {
        let filter = ReviewFilter {
            product: Some(product_id),
            status: Some(ReviewStatus::Approved),
            rating: query.rating,
            verified_only: query.verified_only,
            ..ReviewFilter::default()
        };
        let reviews = self.store.list_reviews(&filter, page).await?;
        let total = self.store.count_reviews(&filter).await?;
        Ok((reviews, total))
    }

    /// Admin listing across all products and statuses.
    pub async fn list_all_reviews(
        &self,
        identity: Identity,
        filter: ReviewFilter,
        page: Page,
    ) -> Result<(Vec<Review>, u64)> {
        if !identity.is_admin() {
            return Err(ServiceError::Forbidden);
        }
        let reviews = self.store.list_reviews(&filter, page).await?;
        let total = self.store.count_reviews(&filter).await?;
        Ok((reviews, total))
    }

    /// Rebuilds a product's rating summary from its approved reviews.
    ///
    /// Zeroes the summary when none remain. A product deleted since the
    /// review was written is tolerated.
    pub async fn recompute_rating(&self, product_id: ProductId) -> Result<RatingSummary> {
        let ratings = self.store.approved_ratings(product_id).await?;
        let summary = RatingSummary::from_ratings(ratings);
        match self.store.set_rating(product_id, &summary).await {
            Ok(()) | Err(store::StoreError::NotFound { .. }) => Ok(summary),
            Err(err) => Err(err.into()),
        }
    }

    async fn load(&self, review_id: ReviewId) -> Result<Review> {
        self.store
            .get_review(review_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "review" })
    }
}
