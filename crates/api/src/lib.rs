//! HTTP API server for the storefront core.
//!
//! REST endpoints for carts, orders, reviews and wishlists over the
//! application services, with identity taken from trusted gateway headers,
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use services::{
    CartService, CatalogService, LoggingNotifier, Notifier, OrderService, ReviewService,
    WishlistService,
};
use store::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub orders: OrderService,
    pub reviews: ReviewService,
    pub wishlists: WishlistService,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list))
        .route("/products/{id}", get(routes::products::get))
        .route("/cart", get(routes::carts::get))
        .route("/cart", delete(routes::carts::clear))
        .route("/cart/items", post(routes::carts::add_item))
        .route("/cart/items/{product_id}", put(routes::carts::update_item))
        .route(
            "/cart/items/{product_id}",
            delete(routes::carts::remove_item),
        )
        .route("/cart/coupon", post(routes::carts::apply_coupon))
        .route("/cart/coupon", delete(routes::carts::remove_coupon))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route(
            "/orders/{id}/addresses",
            put(routes::orders::update_addresses),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/orders/{id}/status", put(routes::orders::update_status))
        .route("/orders/{id}/delivery", put(routes::orders::delivery))
        .route("/products/{id}/reviews", post(routes::reviews::create))
        .route("/products/{id}/reviews", get(routes::reviews::list_for_product))
        .route("/reviews", get(routes::reviews::list_all))
        .route("/reviews/{id}", put(routes::reviews::update))
        .route("/reviews/{id}", delete(routes::reviews::remove))
        .route("/reviews/{id}/helpful", post(routes::reviews::mark_helpful))
        .route("/reviews/{id}/status", put(routes::reviews::moderate))
        .route("/wishlist", get(routes::wishlist::get))
        .route("/wishlist/{product_id}", post(routes::wishlist::add))
        .route("/wishlist/{product_id}", delete(routes::wishlist::remove))
        .route(
            "/wishlist/{product_id}/notifications",
            put(routes::wishlist::set_notifications),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given store, with the logging notifier.
pub fn create_default_state(store: Arc<dyn DocumentStore>) -> Arc<AppState> {
    create_state(store, Arc::new(LoggingNotifier))
}

/// Creates application state with an explicit notifier.
pub fn create_state(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Arc<AppState> {
    Arc::new(AppState {
        catalog: CatalogService::new(Arc::clone(&store)),
        carts: CartService::new(Arc::clone(&store)),
        orders: OrderService::new(Arc::clone(&store), notifier),
        reviews: ReviewService::new(Arc::clone(&store)),
        wishlists: WishlistService::new(store),
    })
}
