//! # Kardex Repository
//!
//! The kardex is the append-only inventory ledger. Every finalized stock
//! movement produces one entry carrying the balance before and after, so
//! the ledger alone can reconstruct the full history of any
//! (product, warehouse) pair.
//!
//! Rows are never updated or deleted. Corrections arrive as new
//! adjustment entries.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::counters;
use bodega_core::{KardexEntry, KardexHistory};

/// Counter name backing kardex row ids.
pub const KARDEX_ID_COUNTER: &str = "kardexId";
/// Counter name backing kardex history row ids.
pub const KARDEX_HISTORY_ID_COUNTER: &str = "kardexHistoryId";

/// Appends a ledger entry and returns its allocated id.
///
/// Ids come from the `kardexId` sequence counter; the entry's own `id`
/// field is ignored.
pub async fn insert(conn: &mut SqliteConnection, entry: &KardexEntry) -> DbResult<i64> {
    let id = counters::next(conn, KARDEX_ID_COUNTER).await?;

    debug!(
        id,
        product_id = %entry.product_id,
        warehouse_id = %entry.warehouse_id,
        movement = ?entry.movement,
        quantity = entry.quantity,
        balance = entry.balance,
        "Appending kardex entry"
    );

    sqlx::query(
        r#"
        INSERT INTO kardex (
            id, product_id, warehouse_id, movement, quantity,
            balance, previous_balance,
            unit_cost_cents, total_cost_cents, unit_price_cents, total_price_cents,
            document_id, document_number, user_id, note, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7,
            ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(id)
    .bind(&entry.product_id)
    .bind(&entry.warehouse_id)
    .bind(entry.movement)
    .bind(entry.quantity)
    .bind(entry.balance)
    .bind(entry.previous_balance)
    .bind(entry.unit_cost_cents)
    .bind(entry.total_cost_cents)
    .bind(entry.unit_price_cents)
    .bind(entry.total_price_cents)
    .bind(&entry.document_id)
    .bind(&entry.document_number)
    .bind(&entry.user_id)
    .bind(&entry.note)
    .bind(entry.created_at)
    .execute(conn)
    .await?;

    Ok(id)
}

/// Records an audit history row alongside a ledger entry. Returns the
/// allocated history id (from the `kardexHistoryId` sequence counter).
pub async fn insert_history(
    conn: &mut SqliteConnection,
    history: &KardexHistory,
) -> DbResult<i64> {
    let id = counters::next(conn, KARDEX_HISTORY_ID_COUNTER).await?;

    sqlx::query(
        r#"
        INSERT INTO kardex_history (
            id, kardex_id, product_id, previous_balance, new_balance,
            user_id, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(id)
    .bind(history.kardex_id)
    .bind(&history.product_id)
    .bind(history.previous_balance)
    .bind(history.new_balance)
    .bind(&history.user_id)
    .bind(&history.reason)
    .bind(history.created_at)
    .execute(conn)
    .await?;

    Ok(id)
}

/// Finds the unit cost of the most recent inbound entry for a
/// (product, warehouse) pair.
///
/// The last fallback of the cost cascade. Prefers the entry's own unit
/// cost; when that is zero (legacy rows), derives it from total cost over
/// quantity. Returns `None` when the pair has no inbound history.
pub async fn last_entrada_unit_cost(
    conn: &mut SqliteConnection,
    product_id: &str,
    warehouse_id: &str,
) -> DbResult<Option<i64>> {
    let row: Option<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT unit_cost_cents, total_cost_cents, quantity
        FROM kardex
        WHERE product_id = ?1 AND warehouse_id = ?2 AND movement = 'entrada'
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|(unit_cost, total_cost, quantity)| {
        if unit_cost > 0 {
            unit_cost
        } else if quantity > 0 {
            total_cost / quantity
        } else {
            0
        }
    }))
}

/// Lists a product's ledger entries at a warehouse, newest first.
pub async fn list_for_product(
    conn: &mut SqliteConnection,
    product_id: &str,
    warehouse_id: &str,
    limit: i64,
) -> DbResult<Vec<KardexEntry>> {
    let entries = sqlx::query_as::<_, KardexEntry>(
        r#"
        SELECT
            id, product_id, warehouse_id, movement, quantity,
            balance, previous_balance,
            unit_cost_cents, total_cost_cents, unit_price_cents, total_price_cents,
            document_id, document_number, user_id, note, created_at
        FROM kardex
        WHERE product_id = ?1 AND warehouse_id = ?2
        ORDER BY created_at DESC, id DESC
        LIMIT ?3
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .bind(limit)
    .fetch_all(conn)
    .await?;

    Ok(entries)
}

// =============================================================================
// Unit Tests
// =============================================================================
