//! Item registry service for stock item metadata and low-stock flagging
//!
//! Owns the descriptive fields of a stock item. `quantity` is written here
//! only on the genesis path (item creation, where it starts equal to
//! `initial_quantity`); afterwards the kardex coordinator is its sole
//! writer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::StockItem;
use shared::validation;

/// Item registry service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Database row for a stock item
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
    description: Option<String>,
    unit_cost: Decimal,
    quantity: Decimal,
    min_stock: Option<Decimal>,
    initial_quantity: Decimal,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for StockItem {
    fn from(row: ItemRow) -> Self {
        StockItem {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            description: row.description,
            unit_cost: row.unit_cost,
            quantity: row.quantity,
            min_stock: row.min_stock,
            initial_quantity: row.initial_quantity,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, company_id, name, description, unit_cost, quantity, min_stock, \
                            initial_quantity, version, created_at, updated_at";

/// Input for creating a stock item (genesis/import path)
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub description: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub initial_quantity: Option<Decimal>,
}

/// Input for updating item metadata
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub min_stock: Option<Decimal>,
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a stock item. This is the only place `initial_quantity` is
    /// set; the cached quantity starts equal to it and no ledger entry is
    /// written.
    pub async fn create_item(
        &self,
        company_id: Uuid,
        input: CreateItemInput,
    ) -> AppResult<StockItem> {
        if let Err(msg) = validation::validate_item_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
                message_pt: "Nome do item inválido".to_string(),
            });
        }

        let unit_cost = input.unit_cost.unwrap_or(Decimal::ZERO);
        if let Err(msg) = validation::validate_unit_cost(unit_cost) {
            return Err(AppError::Validation {
                field: "unit_cost".to_string(),
                message: msg.to_string(),
                message_pt: "O custo unitário não pode ser negativo".to_string(),
            });
        }

        if let Some(min_stock) = input.min_stock {
            if let Err(msg) = validation::validate_min_stock(min_stock) {
                return Err(AppError::Validation {
                    field: "min_stock".to_string(),
                    message: msg.to_string(),
                    message_pt: "O estoque mínimo não pode ser negativo".to_string(),
                });
            }
        }

        let initial_quantity = input.initial_quantity.unwrap_or(Decimal::ZERO);
        if let Err(msg) = validation::validate_initial_quantity(initial_quantity) {
            return Err(AppError::Validation {
                field: "initial_quantity".to_string(),
                message: msg.to_string(),
                message_pt: "A quantidade inicial não pode ser negativa".to_string(),
            });
        }

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO stock_items (company_id, name, description, unit_cost, quantity, min_stock, initial_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $5)
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(company_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(unit_cost)
        .bind(initial_quantity)
        .bind(input.min_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a stock item
    pub async fn get_item(&self, company_id: Uuid, item_id: Uuid) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items WHERE id = $1 AND company_id = $2",
        ))
        .bind(item_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        Ok(row.into())
    }

    /// List all stock items for a company
    pub async fn list_items(&self, company_id: Uuid) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items WHERE company_id = $1 ORDER BY created_at DESC",
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    /// Update item metadata. Never touches `quantity`, `initial_quantity`
    /// or the concurrency version: the ledger stays valid across metadata
    /// edits.
    pub async fn update_metadata(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<StockItem> {
        let existing = self.get_item(company_id, item_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let unit_cost = input.unit_cost.unwrap_or(existing.unit_cost);
        let min_stock = input.min_stock.or(existing.min_stock);

        if let Err(msg) = validation::validate_item_name(&name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
                message_pt: "Nome do item inválido".to_string(),
            });
        }
        if let Err(msg) = validation::validate_unit_cost(unit_cost) {
            return Err(AppError::Validation {
                field: "unit_cost".to_string(),
                message: msg.to_string(),
                message_pt: "O custo unitário não pode ser negativo".to_string(),
            });
        }
        if let Some(min_stock) = min_stock {
            if let Err(msg) = validation::validate_min_stock(min_stock) {
                return Err(AppError::Validation {
                    field: "min_stock".to_string(),
                    message: msg.to_string(),
                    message_pt: "O estoque mínimo não pode ser negativo".to_string(),
                });
            }
        }

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE stock_items
            SET name = $1, description = $2, unit_cost = $3, min_stock = $4, updated_at = NOW()
            WHERE id = $5 AND company_id = $6
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(name.trim())
        .bind(&description)
        .bind(unit_cost)
        .bind(min_stock)
        .bind(item_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List items at or below their minimum stock threshold
    pub async fn list_low_stock(&self, company_id: Uuid) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM stock_items
            WHERE company_id = $1 AND min_stock IS NOT NULL AND quantity <= min_stock
            ORDER BY name
            "#,
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockItem::from).collect())
    }
}
