//! # Document Repository
//!
//! Database operations for documents, line items, item tax rows, and
//! document types.
//!
//! ## Document Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Document Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE DRAFT (bodega-engine DraftWriter)                           │
//! │     └── insert() + insert_item()×N + insert_item_tax()×M               │
//! │         (one transaction, no inventory effect)                         │
//! │                                                                         │
//! │  2. FINALIZE (bodega-engine Finalizer)                                 │
//! │     └── set_stock_date() → posting loop → clock_out()                  │
//! │                                                                         │
//! │  clock_out() is conditional: UPDATE .. WHERE is_clocked_out = 0.       │
//! │  The flag transitions false → true exactly once.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use bodega_core::{Document, DocumentItem, DocumentItemTax, DocumentType, StockDirection};

// =============================================================================
// Document Types
// =============================================================================

/// Inserts a document type (reference data).
pub async fn insert_type(conn: &mut SqliteConnection, ty: &DocumentType) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO document_types (id, name, code, stock_direction)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&ty.id)
    .bind(&ty.name)
    .bind(&ty.code)
    .bind(ty.stock_direction)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets a document type by ID.
pub async fn get_type(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<DocumentType>> {
    let ty = sqlx::query_as::<_, DocumentType>(
        r#"
        SELECT id, name, code, stock_direction
        FROM document_types
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(ty)
}

// =============================================================================
// Documents
// =============================================================================

/// Inserts a document header.
pub async fn insert(conn: &mut SqliteConnection, doc: &Document) -> DbResult<()> {
    debug!(id = %doc.id, number = %doc.number, "Inserting document");

    sqlx::query(
        r#"
        INSERT INTO documents (
            id, number, document_type_id, warehouse_id, counterparty_id,
            date, stock_date, total_cents, discount_cents, is_paid,
            note, internal_note, is_clocked_out, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15
        )
        "#,
    )
    .bind(&doc.id)
    .bind(&doc.number)
    .bind(&doc.document_type_id)
    .bind(&doc.warehouse_id)
    .bind(&doc.counterparty_id)
    .bind(doc.date)
    .bind(doc.stock_date)
    .bind(doc.total_cents)
    .bind(doc.discount_cents)
    .bind(doc.is_paid)
    .bind(&doc.note)
    .bind(&doc.internal_note)
    .bind(doc.is_clocked_out)
    .bind(doc.created_at)
    .bind(doc.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets a document by ID.
pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Document>> {
    let doc = sqlx::query_as::<_, Document>(
        r#"
        SELECT
            id, number, document_type_id, warehouse_id, counterparty_id,
            date, stock_date, total_cents, discount_cents, is_paid,
            note, internal_note, is_clocked_out, created_at, updated_at
        FROM documents
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(doc)
}

/// Lists a warehouse's documents, newest first.
pub async fn list_for_warehouse(
    conn: &mut SqliteConnection,
    warehouse_id: &str,
    limit: i64,
) -> DbResult<Vec<Document>> {
    let docs = sqlx::query_as::<_, Document>(
        r#"
        SELECT
            id, number, document_type_id, warehouse_id, counterparty_id,
            date, stock_date, total_cents, discount_cents, is_paid,
            note, internal_note, is_clocked_out, created_at, updated_at
        FROM documents
        WHERE warehouse_id = ?1
        ORDER BY created_at DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(warehouse_id)
    .bind(limit)
    .fetch_all(conn)
    .await?;

    Ok(docs)
}

/// Stamps the posting timestamp onto a document.
///
/// Posting time, not the document's business date, drives ledger ordering.
pub async fn set_stock_date(
    conn: &mut SqliteConnection,
    id: &str,
    stock_date: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE documents SET stock_date = ?2, updated_at = ?2
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(stock_date)
    .execute(conn)
    .await?;

    Ok(())
}

/// Marks a document as clocked out (posted), conditionally.
///
/// ## Returns
/// `true` if this call performed the transition, `false` if the document
/// was already clocked out (or doesn't exist). The conditional WHERE clause
/// is what makes the false→true transition happen exactly once even under
/// concurrent finalize calls.
pub async fn clock_out(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE documents SET
            is_clocked_out = 1,
            updated_at = ?2
        WHERE id = ?1 AND is_clocked_out = 0
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Document Items
// =============================================================================

/// Adds a line item to a document.
///
/// ## Snapshot Pattern
/// Product details (name, code, unit, barcode) are copied onto the item.
/// This preserves the document's audit trail even if the product is edited
/// or deleted later.
pub async fn insert_item(conn: &mut SqliteConnection, item: &DocumentItem) -> DbResult<()> {
    debug!(document_id = %item.document_id, product_id = %item.product_id, "Adding document item");

    sqlx::query(
        r#"
        INSERT INTO document_items (
            id, document_id, product_id, quantity,
            price_cents, net_price_cents, discount_cents, cost_cents,
            product_name, product_code, product_unit, product_barcode,
            created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12,
            ?13
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.document_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.price_cents)
    .bind(item.net_price_cents)
    .bind(item.discount_cents)
    .bind(item.cost_cents)
    .bind(&item.product_name)
    .bind(&item.product_code)
    .bind(&item.product_unit)
    .bind(&item.product_barcode)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets one page of a document's items, in insertion order (rowid; every
/// line of a draft shares one creation timestamp, so the timestamp cannot
/// order them).
///
/// Callers must page to completion: the finalizer concatenates pages until
/// a short page arrives, so a document never loses lines at a page
/// boundary.
pub async fn items_page(
    conn: &mut SqliteConnection,
    document_id: &str,
    limit: i64,
    offset: i64,
) -> DbResult<Vec<DocumentItem>> {
    let items = sqlx::query_as::<_, DocumentItem>(
        r#"
        SELECT
            id, document_id, product_id, quantity,
            price_cents, net_price_cents, discount_cents, cost_cents,
            product_name, product_code, product_unit, product_barcode,
            created_at
        FROM document_items
        WHERE document_id = ?1
        ORDER BY rowid
        LIMIT ?2 OFFSET ?3
        "#,
    )
    .bind(document_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

/// Writes the posted cost back onto a line item.
///
/// Keeps the document's own record consistent with what was actually
/// posted to the ledger.
pub async fn set_item_cost(
    conn: &mut SqliteConnection,
    item_id: &str,
    cost_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE document_items SET cost_cents = ?2
        WHERE id = ?1
        "#,
    )
    .bind(item_id)
    .bind(cost_cents)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Document Item Taxes
// =============================================================================

/// Inserts one apportioned tax row for a line item.
pub async fn insert_item_tax(
    conn: &mut SqliteConnection,
    tax: &DocumentItemTax,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO document_item_taxes (id, document_item_id, tax_id, rate_bps, amount_cents)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&tax.id)
    .bind(&tax.document_item_id)
    .bind(&tax.tax_id)
    .bind(tax.rate_bps)
    .bind(tax.amount_cents)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets all tax rows for a line item.
pub async fn item_taxes(
    conn: &mut SqliteConnection,
    document_item_id: &str,
) -> DbResult<Vec<DocumentItemTax>> {
    let taxes = sqlx::query_as::<_, DocumentItemTax>(
        r#"
        SELECT id, document_item_id, tax_id, rate_bps, amount_cents
        FROM document_item_taxes
        WHERE document_item_id = ?1
        ORDER BY id
        "#,
    )
    .bind(document_item_id)
    .fetch_all(conn)
    .await?;

    Ok(taxes)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_type() -> DocumentType {
        DocumentType {
            id: "venta".to_string(),
            name: "Venta".to_string(),
            code: Some("100".to_string()),
            stock_direction: StockDirection::Out,
        }
    }

    fn sample_document() -> Document {
        let now = Utc::now();
        Document {
            id: "6f9619ff-8b86-4d01-b42d-00cf4fc964ff".to_string(),
            number: "2025-100-000001".to_string(),
            document_type_id: "venta".to_string(),
            warehouse_id: "w1".to_string(),
            counterparty_id: None,
            date: now,
            stock_date: None,
            total_cents: 11900,
            discount_cents: 0,
            is_paid: false,
            note: None,
            internal_note: None,
            is_clocked_out: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        insert_type(&mut conn, &sample_type()).await.unwrap();
        let doc = sample_document();
        insert(&mut conn, &doc).await.unwrap();

        let loaded = get(&mut conn, &doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.number, "2025-100-000001");
        assert_eq!(loaded.total_cents, 11900);
        assert!(!loaded.is_clocked_out);

        assert!(get(&mut conn, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clock_out_transitions_exactly_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        insert_type(&mut conn, &sample_type()).await.unwrap();
        let doc = sample_document();
        insert(&mut conn, &doc).await.unwrap();

        assert!(clock_out(&mut conn, &doc.id).await.unwrap());
        // Second attempt finds the flag already set
        assert!(!clock_out(&mut conn, &doc.id).await.unwrap());

        let loaded = get(&mut conn, &doc.id).await.unwrap().unwrap();
        assert!(loaded.is_clocked_out);
    }

    #[tokio::test]
    async fn test_list_for_warehouse_filters_and_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        insert_type(&mut conn, &sample_type()).await.unwrap();
        let mut first = sample_document();
        insert(&mut conn, &first).await.unwrap();

        first.id = "8ad026c1-27b1-4c3c-b3e5-1f4a2d9c0e71".to_string();
        first.number = "2025-100-000002".to_string();
        insert(&mut conn, &first).await.unwrap();

        first.id = "f3d1a8be-5c20-4f77-9e0d-6b8c14a2d903".to_string();
        first.number = "2025-100-000003".to_string();
        first.warehouse_id = "w2".to_string();
        insert(&mut conn, &first).await.unwrap();

        let docs = list_for_warehouse(&mut conn, "w1", 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.warehouse_id == "w1"));

        let other = list_for_warehouse(&mut conn, "w2", 10).await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].number, "2025-100-000003");
    }

    #[tokio::test]
    async fn test_items_page_preserves_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        insert_type(&mut conn, &sample_type()).await.unwrap();
        let doc = sample_document();
        insert(&mut conn, &doc).await.unwrap();

        sqlx::query(
            "INSERT INTO products (id, name, code, created_at, updated_at)
             VALUES ('p1', 'Cafe', 'CAFE', ?1, ?1)",
        )
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .unwrap();

        let now = Utc::now();
        for n in 0..5 {
            let item = DocumentItem {
                id: format!("item-{n}"),
                document_id: doc.id.clone(),
                product_id: "p1".to_string(),
                quantity: 1,
                price_cents: 100,
                net_price_cents: 100,
                discount_cents: 0,
                cost_cents: 0,
                product_name: "Cafe".to_string(),
                product_code: "CAFE".to_string(),
                product_unit: None,
                product_barcode: None,
                created_at: now,
            };
            insert_item(&mut conn, &item).await.unwrap();
        }

        let first = items_page(&mut conn, &doc.id, 3, 0).await.unwrap();
        let second = items_page(&mut conn, &doc.id, 3, 3).await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].id, "item-0");
        assert_eq!(second[1].id, "item-4");
    }
}
