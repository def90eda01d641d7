//! Route definitions for the Kardex Stock Ledger Service

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - stock items and their kardex
        .nest("/items", item_routes())
}

/// Stock item and ledger routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::list_low_stock))
        .route(
            "/:item_id",
            get(handlers::get_item).put(handlers::update_item),
        )
        // Ledger
        .route(
            "/:item_id/movements",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route(
            "/:item_id/movements/evidence",
            post(handlers::record_movement_with_evidence),
        )
        // Reconstructed kardex
        .route("/:item_id/kardex", get(handlers::get_kardex))
        .route("/:item_id/kardex/export", get(handlers::export_kardex))
        .route_layer(middleware::from_fn(auth_middleware))
}
