//! HTTP handlers for stock item endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::StockItem;
use crate::services::item::{CreateItemInput, ItemService, UpdateItemInput};
use crate::AppState;

/// Create a stock item (genesis/import path)
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<StockItem>> {
    if !current_user.0.has_permission("stock", "write") {
        return Err(AppError::InsufficientPermissions);
    }
    let service = ItemService::new(state.db);
    let item = service.create_item(current_user.0.company_id, input).await?;
    Ok(Json(item))
}

/// List all stock items for the company
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StockItem>>> {
    let service = ItemService::new(state.db);
    let items = service.list_items(current_user.0.company_id).await?;
    Ok(Json(items))
}

/// Get a stock item
pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<StockItem>> {
    let service = ItemService::new(state.db);
    let item = service.get_item(current_user.0.company_id, item_id).await?;
    Ok(Json(item))
}

/// Update item metadata (never touches the cached quantity)
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<StockItem>> {
    if !current_user.0.has_permission("stock", "write") {
        return Err(AppError::InsufficientPermissions);
    }
    let service = ItemService::new(state.db);
    let item = service
        .update_metadata(current_user.0.company_id, item_id, input)
        .await?;
    Ok(Json(item))
}

/// List items at or below their minimum stock threshold
pub async fn list_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StockItem>>> {
    let service = ItemService::new(state.db);
    let items = service.list_low_stock(current_user.0.company_id).await?;
    Ok(Json(items))
}
