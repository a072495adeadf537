//! Product lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use domain::Product;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::PageParams;

/// GET /products — published products, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.catalog.list_products(params.to_page()).await?;
    Ok(Json(products))
}

/// GET /products/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = state.catalog.get_product(ProductId::from_uuid(id)).await?;
    Ok(Json(product))
}
