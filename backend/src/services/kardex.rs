//! Kardex service: the movement coordinator and ledger read models
//!
//! The coordinator is the only writer of a stock item's cached quantity and
//! of new ledger entries. Both writes happen inside one database
//! transaction, guarded by an optimistic version check on the item row:
//! concurrent movements against the same item never both commit against the
//! same observed state — the loser retries against a fresh read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::ContentStoreClient;
use crate::models::{MovementKind, StockItem, StockMovement};
use crate::services::item::ItemService;
use shared::kardex::{self, BalanceError, DateWindow, KindFilter, LedgerAudit, LedgerLine};
use shared::types::{Attachment, WorkOrderRef};
use shared::validation;

/// How many times a movement is retried against fresh state before the
/// write conflict is surfaced to the caller.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Kardex service
#[derive(Clone)]
pub struct KardexService {
    db: PgPool,
}

/// Input for recording a stock movement
#[derive(Debug, Deserialize)]
pub struct RecordMovementInput {
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub notes: Option<String>,
    /// Evidence references already living in the content store.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub work_order: Option<WorkOrderRef>,
}

/// Evidence file to persist in the content store before the transaction
#[derive(Debug)]
pub struct EvidenceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Reconstructed kardex for one item, newest entry first
#[derive(Debug, Serialize)]
pub struct KardexView {
    pub item: StockItem,
    pub entries: Vec<LedgerLine>,
    pub computed_quantity: Decimal,
    pub cached_quantity: Decimal,
    /// False when the replayed balance disagrees with the cached quantity —
    /// a corruption signal surfaced to operators, never auto-corrected.
    pub consistent: bool,
}

/// Database row for a stock movement
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    seq: i64,
    item_id: Uuid,
    company_id: Uuid,
    kind: String,
    quantity: Decimal,
    notes: Option<String>,
    attachments: Json<Vec<Attachment>>,
    work_order_id: Option<Uuid>,
    work_order_code: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, AppError> {
        let kind = MovementKind::parse(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("unknown movement kind '{}'", row.kind)))?;
        let work_order = match (row.work_order_id, row.work_order_code) {
            (Some(id), Some(display_code)) => Some(WorkOrderRef { id, display_code }),
            _ => None,
        };

        Ok(StockMovement {
            id: row.id,
            seq: row.seq,
            item_id: row.item_id,
            company_id: row.company_id,
            kind,
            quantity: row.quantity,
            notes: row.notes,
            attachments: row.attachments.0,
            work_order,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

const MOVEMENT_COLUMNS: &str = "id, seq, item_id, company_id, kind, quantity, notes, attachments, \
                                work_order_id, work_order_code, created_by, created_at";

impl KardexService {
    /// Create a new KardexService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement.
    ///
    /// Evidence bytes are persisted to the content store before the
    /// transaction is opened; the upload is never retried or rolled back, so
    /// a movement that subsequently fails leaves the uploaded file orphaned
    /// in the store.
    pub async fn apply_movement(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        item_id: Uuid,
        input: RecordMovementInput,
        evidence: Vec<EvidenceFile>,
        content_store: &ContentStoreClient,
    ) -> AppResult<StockMovement> {
        // Validate before opening any transaction
        if let Err(msg) = validation::validate_movement_quantity(input.quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_pt: "A quantidade do movimento deve ser maior que 0".to_string(),
            });
        }

        if input.work_order.is_some() && input.kind == MovementKind::Increase {
            return Err(AppError::Validation {
                field: "work_order".to_string(),
                message: "Work order references are only valid on decrease movements".to_string(),
                message_pt: "Referência de ordem de serviço só é válida em movimentos de saída"
                    .to_string(),
            });
        }

        for attachment in &input.attachments {
            if let Err(msg) = validation::validate_attachment(attachment) {
                return Err(AppError::Validation {
                    field: "attachments".to_string(),
                    message: msg.to_string(),
                    message_pt: "Anexo inválido".to_string(),
                });
            }
        }

        // Validate item belongs to company
        let item_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_items WHERE id = $1 AND company_id = $2)",
        )
        .bind(item_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        // Persist evidence bytes, collecting the returned references
        let mut attachments = input.attachments.clone();
        for file in evidence {
            let uploaded = content_store
                .upload(&file.name, &file.content_type, file.bytes)
                .await?;
            attachments.push(uploaded);
        }

        // Commit loop: re-read fresh state, validate against it, and write
        // both records conditioned on the item version being unchanged.
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut tx = self.db.begin().await?;

            let (current, version) = sqlx::query_as::<_, (Decimal, i64)>(
                "SELECT quantity, version FROM stock_items WHERE id = $1 AND company_id = $2",
            )
            .bind(item_id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

            let new_quantity =
                kardex::next_balance(current, input.kind, input.quantity).map_err(|e| match e {
                    BalanceError::InsufficientStock { available } => {
                        AppError::InsufficientStock { available }
                    }
                    BalanceError::NonPositiveQuantity => AppError::Validation {
                        field: "quantity".to_string(),
                        message: "Movement quantity must be greater than 0".to_string(),
                        message_pt: "A quantidade do movimento deve ser maior que 0".to_string(),
                    },
                })?;

            let updated = sqlx::query(
                r#"
                UPDATE stock_items
                SET quantity = $1, version = version + 1, updated_at = NOW()
                WHERE id = $2 AND version = $3
                "#,
            )
            .bind(new_quantity)
            .bind(item_id)
            .bind(version)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // Another movement committed since our read; retry fresh.
                tx.rollback().await?;
                tracing::debug!(
                    "Movement conflict on item {} (attempt {}), retrying",
                    item_id,
                    attempt
                );
                continue;
            }

            let row = sqlx::query_as::<_, MovementRow>(&format!(
                r#"
                INSERT INTO stock_movements (item_id, company_id, kind, quantity, notes,
                                             attachments, work_order_id, work_order_code, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {MOVEMENT_COLUMNS}
                "#,
            ))
            .bind(item_id)
            .bind(company_id)
            .bind(input.kind.as_str())
            .bind(input.quantity)
            .bind(&input.notes)
            .bind(Json(&attachments))
            .bind(input.work_order.as_ref().map(|w| w.id))
            .bind(input.work_order.as_ref().map(|w| w.display_code.clone()))
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;

            let movement = StockMovement::try_from(row)?;
            tracing::info!(
                "Recorded {} of {} on item {} (new balance {})",
                movement.kind.as_str(),
                movement.quantity,
                item_id,
                new_quantity
            );
            return Ok(movement);
        }

        Err(AppError::ConflictRetryExhausted)
    }

    /// List movements for an item, optionally narrowed by kind and date
    /// window. Filtering happens in the pure read layer, after the ledger is
    /// fetched in its committed order.
    pub async fn list_movements(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        kind: KindFilter,
        window: DateWindow,
    ) -> AppResult<Vec<StockMovement>> {
        let item_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_items WHERE id = $1 AND company_id = $2)",
        )
        .bind(item_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let movements = self.fetch_ledger(company_id, item_id).await?;
        Ok(kardex::filter_movements(movements, kind, window))
    }

    /// Reconstruct the kardex for an item: every movement with its running
    /// balance, newest first, plus the integrity verdict of the replay
    /// against the cached quantity.
    pub async fn get_kardex(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        kind: KindFilter,
        window: DateWindow,
    ) -> AppResult<KardexView> {
        let item = ItemService::new(self.db.clone())
            .get_item(company_id, item_id)
            .await?;
        let movements = self.fetch_ledger(company_id, item_id).await?;

        // Balances replay over the full history; filters narrow afterwards.
        let LedgerAudit {
            lines,
            computed_quantity,
            cached_quantity,
            consistent,
        } = kardex::audit(item.initial_quantity, &movements, item.quantity);

        if !consistent {
            tracing::warn!(
                "Ledger mismatch for item {}: replayed balance {} != cached quantity {}",
                item.id,
                computed_quantity,
                cached_quantity
            );
        }

        let mut entries = kardex::filter_lines(lines, kind, window);
        entries.reverse();

        Ok(KardexView {
            item,
            entries,
            computed_quantity,
            cached_quantity,
            consistent,
        })
    }

    /// Export the full kardex of an item as CSV, oldest entry first
    pub async fn export_kardex_csv(&self, company_id: Uuid, item_id: Uuid) -> AppResult<String> {
        let item = ItemService::new(self.db.clone())
            .get_item(company_id, item_id)
            .await?;
        let movements = self.fetch_ledger(company_id, item_id).await?;
        let lines = kardex::reconstruct(item.initial_quantity, &movements);

        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "date",
            "kind",
            "quantity",
            "balance",
            "notes",
            "work_order",
            "attachments",
        ])
        .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))?;

        for line in &lines {
            let movement = &line.movement;
            wtr.write_record([
                movement.created_at.to_rfc3339(),
                movement.kind.as_str().to_string(),
                movement.quantity.to_string(),
                line.balance.to_string(),
                movement.notes.clone().unwrap_or_default(),
                movement
                    .work_order
                    .as_ref()
                    .map(|w| w.display_code.clone())
                    .unwrap_or_default(),
                movement
                    .attachments
                    .iter()
                    .map(|a| a.url.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            ])
            .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))?;
        }

        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("Failed to finish CSV: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("Invalid CSV data: {}", e)))?;

        Ok(csv_data)
    }

    /// Fetch the full ledger of an item in committed order
    async fn fetch_ledger(&self, company_id: Uuid, item_id: Uuid) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE item_id = $1 AND company_id = $2
            ORDER BY created_at, seq
            "#,
        ))
        .bind(item_id)
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }
}
