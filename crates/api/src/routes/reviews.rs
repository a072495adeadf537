//! Review endpoints: authoring, public listing and moderation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ProductId, ReviewId, UserId};
use domain::{Review, ReviewEdit, ReviewImage, ReviewStatus};
use serde::{Deserialize, Serialize};
use services::{NewReview, ProductReviewQuery};
use store::ReviewFilter;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::routes::PageResponse;

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub rating: u8,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub images: Vec<ReviewImage>,
    pub device_info: Option<String>,
}

#[derive(Deserialize)]
pub struct ProductReviewsQuery {
    pub rating: Option<u8>,
    #[serde(default)]
    pub verified_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct AllReviewsQuery {
    pub product_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<ReviewStatus>,
    pub rating: Option<u8>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct ModerateRequest {
    pub status: ReviewStatus,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct HelpfulResponse {
    pub voted: bool,
}

/// POST /products/{id}/reviews
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = state
        .reviews
        .create_review(
            identity.user,
            ProductId::from_uuid(product_id),
            NewReview {
                rating: req.rating,
                title: req.title,
                content: req.content,
                pros: req.pros,
                cons: req.cons,
                images: req.images,
                device_info: req.device_info,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /products/{id}/reviews — approved reviews only.
pub async fn list_for_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ProductReviewsQuery>,
) -> Result<Json<PageResponse<Review>>, ApiError> {
    let page = store::Page::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));
    let (reviews, total) = state
        .reviews
        .list_product_reviews(
            ProductId::from_uuid(product_id),
            ProductReviewQuery {
                rating: query.rating,
                verified_only: query.verified_only,
            },
            page,
        )
        .await?;
    Ok(Json(PageResponse::new(reviews, total, page)))
}

/// GET /reviews — admin listing across statuses.
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AllReviewsQuery>,
) -> Result<Json<PageResponse<Review>>, ApiError> {
    let page = store::Page::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));
    let filter = ReviewFilter {
        product: query.product_id.map(ProductId::from_uuid),
        user: query.user_id.map(UserId::from_uuid),
        status: query.status,
        rating: query.rating,
        verified_only: false,
    };
    let (reviews, total) = state.reviews.list_all_reviews(identity, filter, page).await?;
    Ok(Json(PageResponse::new(reviews, total, page)))
}

/// PUT /reviews/{id} — owner edit; resets status to pending.
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(edit): Json<ReviewEdit>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .reviews
        .update_review(ReviewId::from_uuid(id), identity, edit)
        .await?;
    Ok(Json(review))
}

/// DELETE /reviews/{id} — owner or admin.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .reviews
        .delete_review(ReviewId::from_uuid(id), identity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /reviews/{id}/helpful — toggles the caller's vote.
pub async fn mark_helpful(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HelpfulResponse>, ApiError> {
    let voted = state
        .reviews
        .mark_helpful(ReviewId::from_uuid(id), identity.user)
        .await?;
    Ok(Json(HelpfulResponse { voted }))
}

/// PUT /reviews/{id}/status — admin moderation.
pub async fn moderate(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ModerateRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .reviews
        .moderate_review(ReviewId::from_uuid(id), identity, req.status, req.comment)
        .await?;
    Ok(Json(review))
}
