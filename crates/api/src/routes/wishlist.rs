//! Wishlist endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{NotificationPrefs, Wishlist};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::CurrentUser;

#[derive(Deserialize)]
pub struct NotificationsRequest {
    #[serde(default)]
    pub price_drops: bool,
    #[serde(default)]
    pub back_in_stock: bool,
}

/// GET /wishlist
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Wishlist>, ApiError> {
    let wishlist = state.wishlists.get_or_create(identity.user).await?;
    Ok(Json(wishlist))
}

/// POST /wishlist/{product_id} — duplicate add is a no-op.
pub async fn add(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Wishlist>), ApiError> {
    let wishlist = state
        .wishlists
        .add_product(identity.user, ProductId::from_uuid(product_id))
        .await?;
    Ok((StatusCode::CREATED, Json(wishlist)))
}

/// DELETE /wishlist/{product_id} — idempotent.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Wishlist>, ApiError> {
    let wishlist = state
        .wishlists
        .remove_product(identity.user, ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(wishlist))
}

/// PUT /wishlist/{product_id}/notifications
pub async fn set_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<NotificationsRequest>,
) -> Result<Json<Wishlist>, ApiError> {
    let wishlist = state
        .wishlists
        .set_notifications(
            identity.user,
            ProductId::from_uuid(product_id),
            NotificationPrefs {
                price_drops: req.price_drops,
                back_in_stock: req.back_in_stock,
            },
        )
        .await?;
    Ok(Json(wishlist))
}
