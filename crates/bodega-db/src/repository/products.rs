//! # Product and Tax Repository
//!
//! Database operations for products, taxes, and their association table.
//!
//! Cost fields on products are a cache of the most recent purchase: every
//! finalized inbound document rolls `cost_cents` and
//! `last_purchase_price_cents` forward so outbound documents can value
//! stock without scanning the ledger.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use bodega_core::{Product, Tax};

// =============================================================================
// Products
// =============================================================================

/// Inserts a product.
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, code, barcode, unit,
            cost_cents, last_purchase_price_cents,
            is_service, is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.code)
    .bind(&product.barcode)
    .bind(&product.unit)
    .bind(product.cost_cents)
    .bind(product.last_purchase_price_cents)
    .bind(product.is_service)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets a product by ID.
pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT
            id, name, code, barcode, unit,
            cost_cents, last_purchase_price_cents,
            is_service, is_active, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Rolls the product's cached cost forward after an inbound posting.
///
/// Updates both the working cost and the last purchase price to the unit
/// cost just posted.
pub async fn roll_forward_cost(
    conn: &mut SqliteConnection,
    id: &str,
    unit_cost_cents: i64,
) -> DbResult<()> {
    debug!(product_id = %id, unit_cost_cents, "Rolling product cost forward");

    sqlx::query(
        r#"
        UPDATE products SET
            cost_cents = ?2,
            last_purchase_price_cents = ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(unit_cost_cents)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Taxes
// =============================================================================

/// Inserts a tax definition.
pub async fn insert_tax(conn: &mut SqliteConnection, tax: &Tax) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO taxes (id, name, rate_bps, is_fixed, is_enabled)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&tax.id)
    .bind(&tax.name)
    .bind(tax.rate_bps)
    .bind(tax.is_fixed)
    .bind(tax.is_enabled)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets a tax by ID.
pub async fn get_tax(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Tax>> {
    let tax = sqlx::query_as::<_, Tax>(
        r#"
        SELECT id, name, rate_bps, is_fixed, is_enabled
        FROM taxes
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(tax)
}

/// Associates a tax with a product.
pub async fn link_product_tax(
    conn: &mut SqliteConnection,
    product_id: &str,
    tax_id: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO product_taxes (product_id, tax_id)
        VALUES (?1, ?2)
        "#,
    )
    .bind(product_id)
    .bind(tax_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets the enabled taxes associated with a product.
///
/// Disabled taxes drop out here; fixed and zero-rate taxes are filtered
/// later by the decomposition step, which needs to see them to decide.
pub async fn taxes_for_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Vec<Tax>> {
    let taxes = sqlx::query_as::<_, Tax>(
        r#"
        SELECT t.id, t.name, t.rate_bps, t.is_fixed, t.is_enabled
        FROM taxes t
        JOIN product_taxes pt ON pt.tax_id = t.id
        WHERE pt.product_id = ?1 AND t.is_enabled = 1
        ORDER BY t.id
        "#,
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;

    Ok(taxes)
}

// =============================================================================
// Unit Tests
// =============================================================================
