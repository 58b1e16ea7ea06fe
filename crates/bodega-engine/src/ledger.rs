//! # Kardex Ledger Writer
//!
//! The single write path into the kardex. Allocates row ids from the
//! sequence counters, resolves the pre-movement balance when the caller
//! doesn't supply one, and writes the audit history row whenever the
//! acting user is known. The finalizer routes every posting through
//! [`append`]; [`KardexWriter`] wraps the same path for standalone
//! adjustments (stock takes, corrections, shrinkage write-offs).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::EngineResult;
use bodega_core::validation::{validate_quantity, validate_required_id};
use bodega_core::{CoreError, KardexEntry, KardexHistory, KardexMovement};
use bodega_db::repository::{kardex, products, stock};
use bodega_db::Database;

// =============================================================================
// Ledger Append
// =============================================================================

/// A ledger entry to append. The stored row's id is allocated here, never
/// supplied.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub product_id: String,
    pub warehouse_id: String,
    pub movement: KardexMovement,
    /// Quantity moved (positive; the movement type carries the sign).
    pub quantity: i64,
    /// Balance after the movement.
    pub balance: i64,
    /// Balance before the movement. The finalizer always supplies this (it
    /// has already mutated stock); when absent, it is read from the stock
    /// projection: the warehouse-scoped row, or the product's total across
    /// warehouses when the pair has none.
    pub previous_balance: Option<i64>,
    pub unit_cost_cents: i64,
    pub total_cost_cents: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub document_id: Option<String>,
    pub document_number: Option<String>,
    pub user_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Appends one ledger row (plus its history row when a user is known) on
/// the caller's connection, and returns the new kardex id.
///
/// Runs inside whatever transaction the caller has open; the finalizer
/// calls this once per posted line.
pub async fn append(conn: &mut SqliteConnection, entry: LedgerEntry) -> EngineResult<i64> {
    let previous_balance = match entry.previous_balance {
        Some(balance) => balance,
        None => match stock::get(conn, &entry.product_id, &entry.warehouse_id).await? {
            Some(row) => row.quantity,
            None => stock::total_quantity(conn, &entry.product_id).await?,
        },
    };

    let row = KardexEntry {
        id: 0,
        product_id: entry.product_id.clone(),
        warehouse_id: entry.warehouse_id.clone(),
        movement: entry.movement,
        quantity: entry.quantity,
        balance: entry.balance,
        previous_balance,
        unit_cost_cents: entry.unit_cost_cents,
        total_cost_cents: entry.total_cost_cents,
        unit_price_cents: entry.unit_price_cents,
        total_price_cents: entry.total_price_cents,
        document_id: entry.document_id.clone(),
        document_number: entry.document_number.clone(),
        user_id: entry.user_id.clone(),
        note: entry.note.clone(),
        created_at: entry.created_at,
    };
    let kardex_id = kardex::insert(conn, &row).await?;

    if let Some(user) = &entry.user_id {
        let history = KardexHistory {
            id: 0,
            kardex_id,
            product_id: entry.product_id.clone(),
            previous_balance,
            new_balance: entry.balance,
            user_id: user.clone(),
            // The audit row's reason reuses the ledger entry's note
            reason: entry.note.clone(),
            created_at: entry.created_at,
        };
        kardex::insert_history(conn, &history).await?;
    }

    Ok(kardex_id)
}

// =============================================================================
// Adjustment Service
// =============================================================================

/// A requested adjustment movement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendRequest {
    pub product_id: String,
    pub warehouse_id: String,
    /// Signed quantity delta: positive adds stock, negative removes it.
    pub quantity_delta: i64,
    /// Unit cost to record; defaults to the product's cached cost.
    #[serde(default)]
    pub unit_cost_cents: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Service that appends adjustment entries outside any document.
#[derive(Debug, Clone)]
pub struct KardexWriter {
    db: Database,
}

impl KardexWriter {
    pub fn new(db: Database) -> Self {
        KardexWriter { db }
    }

    /// Appends an adjustment: updates the stock projection and writes one
    /// AJUSTE ledger row, atomically. Returns the allocated kardex id.
    pub async fn append(&self, request: AppendRequest) -> EngineResult<i64> {
        validate_required_id("productId", &request.product_id)?;
        validate_required_id("warehouseId", &request.warehouse_id)?;
        validate_quantity(request.quantity_delta.abs())?;

        let mut tx = self.db.begin().await?;

        let product = products::get(&mut *tx, &request.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        let current = stock::get(&mut *tx, &request.product_id, &request.warehouse_id)
            .await?
            .map(|s| s.quantity)
            .unwrap_or(0);
        let new_balance = current + request.quantity_delta;

        stock::upsert_quantity(
            &mut *tx,
            &request.product_id,
            &request.warehouse_id,
            new_balance,
        )
        .await?;

        let unit_cost = match request.unit_cost_cents {
            Some(cents) if cents > 0 => cents,
            _ => product.cost_cents,
        };
        let quantity = request.quantity_delta.abs();

        let kardex_id = append(
            &mut *tx,
            LedgerEntry {
                product_id: request.product_id.clone(),
                warehouse_id: request.warehouse_id.clone(),
                movement: KardexMovement::Ajuste,
                quantity,
                balance: new_balance,
                previous_balance: Some(current),
                unit_cost_cents: unit_cost,
                total_cost_cents: unit_cost * quantity,
                unit_price_cents: 0,
                total_price_cents: 0,
                document_id: None,
                document_number: None,
                user_id: request.user_id.clone(),
                note: request.note.clone(),
                created_at: Utc::now(),
            },
        )
        .await?;

        tx.commit().await.map_err(bodega_db::DbError::from)?;

        info!(
            kardex_id,
            product_id = %request.product_id,
            warehouse_id = %request.warehouse_id,
            delta = request.quantity_delta,
            previous_balance = current,
            balance = new_balance,
            "Kardex adjustment appended"
        );

        Ok(kardex_id)
    }
}
