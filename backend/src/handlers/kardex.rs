//! HTTP handlers for kardex ledger endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::ContentStoreClient;
use crate::middleware::CurrentUser;
use crate::models::StockMovement;
use crate::services::kardex::{EvidenceFile, KardexService, KardexView, RecordMovementInput};
use crate::AppState;
use shared::kardex::{DateWindow, KindFilter};

/// Query parameters for ledger reads
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    #[serde(default)]
    pub kind: KindFilter,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LedgerQuery {
    fn window(&self) -> DateWindow {
        DateWindow {
            from: self.from,
            to: self.to,
        }
    }
}

/// Record a stock movement with pre-uploaded attachment references
pub async fn record_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<Json<StockMovement>> {
    if !current_user.0.has_permission("stock", "write") {
        return Err(AppError::InsufficientPermissions);
    }
    let content_store = ContentStoreClient::new(&state.config.content_store);
    let service = KardexService::new(state.db);
    let movement = service
        .apply_movement(
            current_user.0.company_id,
            current_user.0.user_id,
            item_id,
            input,
            Vec::new(),
            &content_store,
        )
        .await?;
    Ok(Json(movement))
}

/// Record a stock movement with evidence files.
///
/// Multipart payload: a `movement` part carrying the movement JSON, plus any
/// number of `evidence` file parts persisted to the content store before the
/// ledger transaction.
pub async fn record_movement_with_evidence(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<StockMovement>> {
    if !current_user.0.has_permission("stock", "write") {
        return Err(AppError::InsufficientPermissions);
    }

    let mut input: Option<RecordMovementInput> = None;
    let mut evidence = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("movement") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(format!("Invalid movement part: {}", e)))?;
                input = Some(serde_json::from_slice(&bytes).map_err(|e| {
                    multipart_error(format!("Invalid movement JSON: {}", e))
                })?);
            }
            Some("evidence") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("attachment")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(format!("Invalid evidence part: {}", e)))?;
                evidence.push(EvidenceFile {
                    name: file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let input = input.ok_or_else(|| multipart_error("Missing movement part".to_string()))?;

    let content_store = ContentStoreClient::new(&state.config.content_store);
    let service = KardexService::new(state.db);
    let movement = service
        .apply_movement(
            current_user.0.company_id,
            current_user.0.user_id,
            item_id,
            input,
            evidence,
            &content_store,
        )
        .await?;
    Ok(Json(movement))
}

/// List movements for an item, optionally filtered by kind and date window
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = KardexService::new(state.db);
    let movements = service
        .list_movements(
            current_user.0.company_id,
            item_id,
            query.kind,
            query.window(),
        )
        .await?;
    Ok(Json(movements))
}

/// Get the reconstructed kardex with running balances for an item
pub async fn get_kardex(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<KardexView>> {
    let service = KardexService::new(state.db);
    let view = service
        .get_kardex(
            current_user.0.company_id,
            item_id,
            query.kind,
            query.window(),
        )
        .await?;
    Ok(Json(view))
}

/// Export the full kardex of an item as CSV
pub async fn export_kardex(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = KardexService::new(state.db);
    let csv_data = service
        .export_kardex_csv(current_user.0.company_id, item_id)
        .await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"kardex-{}.csv\"", item_id),
            ),
        ],
        csv_data,
    ))
}

fn multipart_error(message: String) -> AppError {
    AppError::Validation {
        field: "multipart".to_string(),
        message,
        message_pt: "Conteúdo multipart inválido".to_string(),
    }
}
