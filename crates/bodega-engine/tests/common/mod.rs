//! Shared fixtures for the engine integration tests.
//!
//! The in-memory pool is capped at one connection, so helpers acquire and
//! release it before any service call begins its transaction.

#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use bodega_core::{DocumentType, KardexEntry, Product, StockDirection, Tax};
use bodega_db::repository::{documents, kardex, products, settings, stock};
use bodega_db::{Database, DbConfig};

/// Document type ids used across the tests.
pub const VENTA: &str = "venta";
pub const COMPRA: &str = "compra";
pub const NOTA: &str = "nota";

pub const WAREHOUSE: &str = "w1";

/// Creates a migrated in-memory database with the three document types.
pub async fn test_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    {
        let mut conn = db.acquire().await.unwrap();
        for ty in [
            DocumentType {
                id: VENTA.to_string(),
                name: "Venta".to_string(),
                code: Some("100".to_string()),
                stock_direction: StockDirection::Out,
            },
            DocumentType {
                id: COMPRA.to_string(),
                name: "Compra".to_string(),
                code: Some("200".to_string()),
                stock_direction: StockDirection::In,
            },
            DocumentType {
                id: NOTA.to_string(),
                name: "Nota".to_string(),
                code: None,
                stock_direction: StockDirection::None,
            },
        ] {
            documents::insert_type(&mut conn, &ty).await.unwrap();
        }
    }
    db
}

/// Inserts a product with the given cached cost and returns its id.
pub async fn seed_product(db: &Database, name: &str, cost_cents: i64) -> String {
    seed_product_full(db, name, cost_cents, 0, false).await
}

/// Inserts a product with full control over cost fields and the service flag.
pub async fn seed_product_full(
    db: &Database,
    name: &str,
    cost_cents: i64,
    last_purchase_price_cents: i64,
    is_service: bool,
) -> String {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let mut conn = db.acquire().await.unwrap();
    products::insert(
        &mut conn,
        &Product {
            id: id.clone(),
            name: name.to_string(),
            code: format!("SKU-{}", &id[..8]),
            barcode: None,
            unit: Some("und".to_string()),
            cost_cents,
            last_purchase_price_cents,
            is_service,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .unwrap();
    id
}

/// Inserts a percentage tax and links it to a product.
pub async fn seed_tax(db: &Database, product_id: &str, tax_id: &str, rate_bps: i64) {
    let mut conn = db.acquire().await.unwrap();
    products::insert_tax(
        &mut conn,
        &Tax {
            id: tax_id.to_string(),
            name: tax_id.to_uppercase(),
            rate_bps,
            is_fixed: false,
            is_enabled: true,
        },
    )
    .await
    .unwrap();
    products::link_product_tax(&mut conn, product_id, tax_id)
        .await
        .unwrap();
}

/// Sets the on-hand quantity for a (product, warehouse) pair directly.
pub async fn set_stock(db: &Database, product_id: &str, quantity: i64) {
    let mut conn = db.acquire().await.unwrap();
    stock::upsert_quantity(&mut conn, product_id, WAREHOUSE, quantity)
        .await
        .unwrap();
}

/// Reads the on-hand quantity; missing row reads as zero.
pub async fn stock_qty(db: &Database, product_id: &str) -> i64 {
    let mut conn = db.acquire().await.unwrap();
    stock::get(&mut conn, product_id, WAREHOUSE)
        .await
        .unwrap()
        .map(|s| s.quantity)
        .unwrap_or(0)
}

/// Lists a product's ledger rows, newest first.
pub async fn kardex_rows(db: &Database, product_id: &str) -> Vec<KardexEntry> {
    let mut conn = db.acquire().await.unwrap();
    kardex::list_for_product(&mut conn, product_id, WAREHOUSE, 100)
        .await
        .unwrap()
}

/// Sets the negative-stock policy setting.
pub async fn set_allow_negative_stock(db: &Database, allowed: bool) {
    let mut conn = db.acquire().await.unwrap();
    settings::set(
        &mut conn,
        settings::ALLOW_NEGATIVE_STOCK,
        if allowed { "true" } else { "false" },
    )
    .await
    .unwrap();
}
