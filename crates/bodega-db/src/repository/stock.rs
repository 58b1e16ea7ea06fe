//! # Stock Repository
//!
//! Per-warehouse stock levels, keyed by (product_id, warehouse_id).
//!
//! Lookups are exact-key only: a missing row means zero on hand at that
//! warehouse. Upserts absorb both the first movement for a pair and every
//! later adjustment through the same statement.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use bodega_core::Stock;

/// Gets the stock row for a product at a warehouse.
///
/// Returns `None` when the pair has never moved; callers treat that as a
/// zero balance.
pub async fn get(
    conn: &mut SqliteConnection,
    product_id: &str,
    warehouse_id: &str,
) -> DbResult<Option<Stock>> {
    let stock = sqlx::query_as::<_, Stock>(
        r#"
        SELECT product_id, warehouse_id, quantity, updated_at
        FROM stock
        WHERE product_id = ?1 AND warehouse_id = ?2
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .fetch_optional(conn)
    .await?;

    Ok(stock)
}

/// Gets a product's total quantity across all warehouses.
pub async fn total_quantity(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(quantity) FROM stock WHERE product_id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_one(conn)
    .await?;

    Ok(total.unwrap_or(0))
}

/// Sets the stock level for a (product, warehouse) pair.
///
/// Inserts the row on first movement, overwrites the quantity on every
/// subsequent one.
pub async fn upsert_quantity(
    conn: &mut SqliteConnection,
    product_id: &str,
    warehouse_id: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(product_id, warehouse_id, quantity, "Upserting stock level");

    sqlx::query(
        r#"
        INSERT INTO stock (product_id, warehouse_id, quantity, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(product_id, warehouse_id)
        DO UPDATE SET quantity = excluded.quantity, updated_at = excluded.updated_at
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::products;
    use bodega_core::Product;

    async fn seed_product(conn: &mut SqliteConnection, id: &str) {
        let now = Utc::now();
        products::insert(
            conn,
            &Product {
                id: id.to_string(),
                name: "Azucar 1kg".to_string(),
                code: format!("SKU-{id}"),
                barcode: None,
                unit: None,
                cost_cents: 3000,
                last_purchase_price_cents: 0,
                is_service: false,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_row_means_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        seed_product(&mut conn, "p1").await;
        assert!(get(&mut conn, "p1", "w1").await.unwrap().is_none());
        assert_eq!(total_quantity(&mut conn, "p1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        seed_product(&mut conn, "p1").await;
        upsert_quantity(&mut conn, "p1", "w1", 10).await.unwrap();
        upsert_quantity(&mut conn, "p1", "w1", 6).await.unwrap();

        let stock = get(&mut conn, "p1", "w1").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 6);
    }

    #[tokio::test]
    async fn test_total_sums_warehouses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        seed_product(&mut conn, "p1").await;
        upsert_quantity(&mut conn, "p1", "w1", 4).await.unwrap();
        upsert_quantity(&mut conn, "p1", "w2", 7).await.unwrap();

        assert_eq!(total_quantity(&mut conn, "p1").await.unwrap(), 11);
    }
}
