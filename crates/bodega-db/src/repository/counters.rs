//! # Counter Repository
//!
//! Monotonic integer sequences: the generic named counter used for kardex
//! row ids, and the composite-keyed counter behind document numbering.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A read-modify-write counter has a race window:                         │
//! │                                                                         │
//! │    A: read 41          B: read 41                                       │
//! │    A: write 42         B: write 42        ← duplicate!                  │
//! │                                                                         │
//! │  Both counters here are a single upsert-returning statement instead:    │
//! │                                                                         │
//! │    INSERT .. ON CONFLICT DO UPDATE SET value = value + 1                │
//! │    RETURNING value                                                      │
//! │                                                                         │
//! │  SQLite executes the statement atomically; concurrent callers get      │
//! │  distinct, strictly increasing values. Values are never reused and     │
//! │  never decremented.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Returns the next value of the named sequence.
///
/// The first call on a name yields 1; each subsequent call yields the
/// previous value + 1.
///
/// ## Example
/// ```rust,ignore
/// let id = counters::next(&mut conn, "kardexId").await?;
/// ```
pub async fn next(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO counters (name, value)
        VALUES (?1, 1)
        ON CONFLICT(name) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(name)
    .fetch_one(conn)
    .await?;

    debug!(name = %name, value = %value, "Sequence advanced");

    Ok(value)
}

/// Returns the next document number sequence for the composite key
/// (document type, warehouse, year, month).
///
/// First allocation on a key yields 1. The same atomic upsert-returning
/// statement as [`next`], so concurrent allocations cannot collide.
pub async fn next_document_sequence(
    conn: &mut SqliteConnection,
    document_type_id: &str,
    warehouse_id: &str,
    year: i32,
    month: u32,
) -> DbResult<i64> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_number_counters (document_type_id, warehouse_id, year, month, sequence)
        VALUES (?1, ?2, ?3, ?4, 1)
        ON CONFLICT(document_type_id, warehouse_id, year, month)
            DO UPDATE SET sequence = sequence + 1
        RETURNING sequence
        "#,
    )
    .bind(document_type_id)
    .bind(warehouse_id)
    .bind(year)
    .bind(month)
    .fetch_one(conn)
    .await?;

    debug!(
        document_type_id = %document_type_id,
        warehouse_id = %warehouse_id,
        year = %year,
        month = %month,
        sequence = %sequence,
        "Document sequence advanced"
    );

    Ok(sequence)
}

// =============================================================================
// Unit Tests
// =============================================================================
