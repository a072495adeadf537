//! Cart endpoints. All operate on the caller's own cart.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::ProductId;
use domain::{AppliedCoupon, Cart};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::CurrentUser;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
    pub discount_percentage: u32,
    pub expires_at: DateTime<Utc>,
}

/// GET /cart
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.get_or_create(identity.user).await?;
    Ok(Json(cart))
}

/// POST /cart/items
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<Cart>), ApiError> {
    let cart = state
        .carts
        .add_item(
            identity.user,
            ProductId::from_uuid(req.product_id),
            req.quantity,
            req.specs,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// PUT /cart/items/{product_id} — quantity 0 removes the line.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .update_item_quantity(identity.user, ProductId::from_uuid(product_id), req.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart/items/{product_id} — idempotent.
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .remove_item(identity.user, ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart
pub async fn clear(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.clear(identity.user).await?;
    Ok(Json(cart))
}

/// POST /cart/coupon
pub async fn apply_coupon(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Json<Cart>, ApiError> {
    let coupon = AppliedCoupon {
        code: req.code,
        discount_percentage: req.discount_percentage,
        expires_at: req.expires_at,
    };
    let cart = state.carts.apply_coupon(identity.user, coupon).await?;
    Ok(Json(cart))
}

/// DELETE /cart/coupon
pub async fn remove_coupon(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.remove_coupon(identity.user).await?;
    Ok(Json(cart))
}
