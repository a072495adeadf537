//! Order endpoints: placement, reads, address updates and lifecycle changes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{
    Address, BillingInfo, Channel, DeliveryAttemptStatus, Order, OrderMetadata, OrderStatus,
    ShippingMethod,
};
use serde::Deserialize;
use services::{AddressUpdate, DeliveryReport, PlaceOrder};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::routes::PageResponse;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub billing: BillingInfo,
    pub shipping_address: Address,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Channel,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateAddressesRequest {
    pub billing: Option<BillingInfo>,
    pub shipping_address: Option<Address>,
    pub shipping_method: Option<ShippingMethod>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct DeliveryRequest {
    pub status: DeliveryAttemptStatus,
    pub verification_code: Option<String>,
    pub notes: Option<String>,
}

/// POST /orders — place an order from the caller's cart.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    // First hop of x-forwarded-for; the proxy in front terminates clients.
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    let order = state
        .orders
        .place_order(
            identity,
            PlaceOrder {
                billing: req.billing,
                shipping_address: req.shipping_address,
                shipping_method: req.shipping_method,
                notes: req.notes,
                metadata: OrderMetadata {
                    source: req.source,
                    ip_address,
                    user_agent,
                },
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — admin sees all orders, users their own.
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<PageResponse<Order>>, ApiError> {
    let page = store::Page::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));
    let (orders, total) = state.orders.list_orders(identity, query.status, page).await?;
    Ok(Json(PageResponse::new(orders, total, page)))
}

/// GET /orders/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get_order(OrderId::from_uuid(id), identity)
        .await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/addresses — only while pending/confirmed.
pub async fn update_addresses(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAddressesRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .update_addresses(
            OrderId::from_uuid(id),
            identity,
            AddressUpdate {
                billing: req.billing,
                shipping_address: req.shipping_address,
                shipping_method: req.shipping_method,
            },
        )
        .await?;
    Ok(Json(order))
}

/// POST /orders/{id}/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .cancel_order(OrderId::from_uuid(id), identity)
        .await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/status — admin only.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .update_status(
            OrderId::from_uuid(id),
            identity,
            req.status,
            req.tracking_number,
            req.estimated_delivery,
        )
        .await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/delivery — delivery agent report, admin only.
pub async fn delivery(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DeliveryRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .record_delivery(
            OrderId::from_uuid(id),
            identity,
            DeliveryReport {
                status: req.status,
                verification_code: req.verification_code,
                notes: req.notes,
            },
        )
        .await?;
    Ok(Json(order))
}
