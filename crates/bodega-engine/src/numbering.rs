//! # Document Numbering
//!
//! Allocates human-readable document numbers of the form
//! `{year}-{code}-{sequence}`:
//!
//! ```text
//! 2025-100-000042
//! ──┬─ ─┬─ ───┬──
//!   │   │     └── zero-padded sequence, strictly increasing per
//!   │   │         (type, warehouse, year, month), never reused
//!   │   └──────── document type code ("000" when the type has none)
//!   └──────────── business-timezone year
//! ```
//!
//! The year and month come from a fixed business timezone, not from the
//! server's local clock, so a document created at 11 PM on the 31st lands
//! in the month the business considers it to belong to.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::EngineResult;
use bodega_core::{DocumentType, DOCUMENT_NUMBER_PAD};
use bodega_db::repository::counters;

/// Offset of the fixed business timezone (UTC-5).
const BUSINESS_TZ_OFFSET_SECS: i32 = -5 * 3600;

/// Returns the business-timezone (year, month) for an instant.
pub fn business_year_month(at: DateTime<Utc>) -> (i32, u32) {
    // west_opt/east_opt only reject out-of-range offsets; -5h is valid
    let tz = FixedOffset::east_opt(BUSINESS_TZ_OFFSET_SECS)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    let local = at.with_timezone(&tz);
    (local.year(), local.month())
}

/// Allocates the next document number for a (type, warehouse) pair.
///
/// Consumes one sequence value even if the surrounding transaction later
/// rolls back for unrelated reasons once committed elsewhere; gaps are
/// acceptable, reuse is not.
pub async fn allocate(
    conn: &mut SqliteConnection,
    document_type: &DocumentType,
    warehouse_id: &str,
    at: DateTime<Utc>,
) -> EngineResult<String> {
    let (year, month) = business_year_month(at);

    let sequence =
        counters::next_document_sequence(conn, &document_type.id, warehouse_id, year, month)
            .await?;

    let number = format!(
        "{}-{}-{:0pad$}",
        year,
        document_type.numbering_code(),
        sequence,
        pad = DOCUMENT_NUMBER_PAD
    );

    debug!(
        document_type_id = %document_type.id,
        warehouse_id,
        year,
        month,
        sequence,
        number = %number,
        "Allocated document number"
    );

    Ok(number)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_business_year_month_shifts_across_midnight() {
        // 2025-01-01 03:00 UTC is still 2024-12-31 22:00 in UTC-5
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();
        assert_eq!(business_year_month(at), (2024, 12));

        // 2025-01-01 06:00 UTC is 01:00 on the 1st in UTC-5
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap();
        assert_eq!(business_year_month(at), (2025, 1));
    }

    #[tokio::test]
    async fn test_allocate_formats_and_increments() {
        let db = bodega_db::Database::new(bodega_db::DbConfig::in_memory())
            .await
            .unwrap();
        let mut conn = db.acquire().await.unwrap();

        let ty = DocumentType {
            id: "venta".to_string(),
            name: "Venta".to_string(),
            code: Some("100".to_string()),
            stock_direction: bodega_core::StockDirection::Out,
        };
        let at = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        let first = allocate(&mut conn, &ty, "w1", at).await.unwrap();
        let second = allocate(&mut conn, &ty, "w1", at).await.unwrap();
        assert_eq!(first, "2025-100-000001");
        assert_eq!(second, "2025-100-000002");

        // A different warehouse gets its own sequence
        let other = allocate(&mut conn, &ty, "w2", at).await.unwrap();
        assert_eq!(other, "2025-100-000001");
    }

    #[tokio::test]
    async fn test_allocate_default_code() {
        let db = bodega_db::Database::new(bodega_db::DbConfig::in_memory())
            .await
            .unwrap();
        let mut conn = db.acquire().await.unwrap();

        let ty = DocumentType {
            id: "nota".to_string(),
            name: "Nota".to_string(),
            code: None,
            stock_direction: bodega_core::StockDirection::None,
        };
        let at = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        let number = allocate(&mut conn, &ty, "w1", at).await.unwrap();
        assert_eq!(number, "2025-000-000001");
    }
}
