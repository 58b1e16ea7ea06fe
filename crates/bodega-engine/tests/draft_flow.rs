//! End-to-end tests for draft creation and document numbering.

mod common;

use common::*;

use bodega_db::repository::documents;
use bodega_engine::draft::{CreateDocumentRequest, DraftLine, DraftWriter, HeaderDiscount};
use uuid::Uuid;

fn request(document_type_id: &str, lines: Vec<DraftLine>) -> CreateDocumentRequest {
    CreateDocumentRequest {
        document_id: Uuid::new_v4().to_string(),
        document_type_id: document_type_id.to_string(),
        warehouse_id: WAREHOUSE.to_string(),
        counterparty_id: None,
        date: None,
        is_paid: false,
        note: None,
        internal_note: None,
        discount: None,
        lines,
    }
}

fn line(product_id: &str, quantity: i64, price_cents: i64) -> DraftLine {
    DraftLine {
        product_id: product_id.to_string(),
        quantity,
        price_cents,
        discount_cents: 0,
        cost_cents: None,
        tax_ids: None,
    }
}

#[tokio::test]
async fn draft_creates_no_inventory_effect() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;

    let draft = DraftWriter::new(db.clone())
        .create_document(request(VENTA, vec![line(&product_id, 3, 12000)]))
        .await
        .unwrap();

    assert!(!draft.is_clocked_out);
    assert!(draft.stock_date.is_none());
    assert_eq!(draft.total_cents, 36000);

    // No stock, no ledger rows until finalize
    assert_eq!(stock_qty(&db, &product_id).await, 0);
    assert!(kardex_rows(&db, &product_id).await.is_empty());
}

#[tokio::test]
async fn numbering_is_monotonic_and_formatted() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;
    let writer = DraftWriter::new(db.clone());

    let first = writer
        .create_document(request(VENTA, vec![line(&product_id, 1, 1000)]))
        .await
        .unwrap();
    let second = writer
        .create_document(request(VENTA, vec![line(&product_id, 1, 1000)]))
        .await
        .unwrap();

    // "{year}-{code}-{seq:06}" with the sequence increasing per type
    let year: i32 = first.number.split('-').next().unwrap().parse().unwrap();
    assert!(year >= 2025);
    assert!(first.number.ends_with("-100-000001"), "{}", first.number);
    assert!(second.number.ends_with("-100-000002"), "{}", second.number);

    // A different document type has its own sequence and default code
    let nota = writer
        .create_document(request(NOTA, vec![line(&product_id, 1, 1000)]))
        .await
        .unwrap();
    assert!(nota.number.ends_with("-000-000001"), "{}", nota.number);
}

#[tokio::test]
async fn draft_decomposes_inclusive_taxes() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;
    seed_tax(&db, &product_id, "iva19", 1900).await;

    // OUT documents always price tax-inclusive: one unit at 119.00
    let draft = DraftWriter::new(db.clone())
        .create_document(request(VENTA, vec![line(&product_id, 1, 11900)]))
        .await
        .unwrap();

    let mut conn = db.acquire().await.unwrap();
    let items = documents::items_page(&mut conn, &draft.id, 10, 0).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].net_price_cents, 10000);

    let taxes = documents::item_taxes(&mut conn, &items[0].id).await.unwrap();
    assert_eq!(taxes.len(), 1);
    assert_eq!(taxes[0].rate_bps, 1900);
    assert_eq!(taxes[0].amount_cents, 1900);
    // Net + tax reconstructs the gross
    assert_eq!(items[0].net_price_cents + taxes[0].amount_cents, 11900);
}

#[tokio::test]
async fn inbound_draft_reads_liquidation_note() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;
    seed_tax(&db, &product_id, "iva19", 1900).await;

    // ivaIncludedInCost: false → exclusive pricing, net stays at the
    // entered price and tax is added on top
    let mut req = request(COMPRA, vec![line(&product_id, 1, 10000)]);
    req.internal_note = Some(r#"{"ivaIncludedInCost": false}"#.to_string());

    let draft = DraftWriter::new(db.clone()).create_document(req).await.unwrap();

    let mut conn = db.acquire().await.unwrap();
    let items = documents::items_page(&mut conn, &draft.id, 10, 0).await.unwrap();
    assert_eq!(items[0].net_price_cents, 10000);
    let taxes = documents::item_taxes(&mut conn, &items[0].id).await.unwrap();
    assert_eq!(taxes[0].amount_cents, 1900);
}

#[tokio::test]
async fn header_discount_reduces_total() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;

    let mut req = request(VENTA, vec![line(&product_id, 2, 5000)]);
    req.discount = Some(HeaderDiscount::Percent(1000));

    let draft = DraftWriter::new(db.clone()).create_document(req).await.unwrap();
    assert_eq!(draft.total_cents, 9000);
    assert_eq!(draft.discount_cents, 1000);
}

#[tokio::test]
async fn line_discounts_leave_header_total_naive() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;

    // Header total is Σ(quantity × price); the line discount only shapes
    // the line's own gross
    let mut discounted = line(&product_id, 2, 5000);
    discounted.discount_cents = 1500;

    let draft = DraftWriter::new(db.clone())
        .create_document(request(VENTA, vec![discounted]))
        .await
        .unwrap();
    assert_eq!(draft.total_cents, 10000);
    assert_eq!(draft.discount_cents, 0);

    let mut conn = db.acquire().await.unwrap();
    let items = documents::items_page(&mut conn, &draft.id, 10, 0).await.unwrap();
    assert_eq!(items[0].discount_cents, 1500);
}

#[tokio::test]
async fn backdated_date_does_not_shift_the_numbering_period() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;
    let writer = DraftWriter::new(db.clone());

    let mut backdated = request(VENTA, vec![line(&product_id, 1, 1000)]);
    backdated.date = Some("2019-03-15T12:00:00Z".parse().unwrap());
    let first = writer.create_document(backdated).await.unwrap();

    let second = writer
        .create_document(request(VENTA, vec![line(&product_id, 1, 1000)]))
        .await
        .unwrap();

    // Both drafts draw from the current period's counter: same year
    // prefix, consecutive sequences
    assert!(!first.number.starts_with("2019-"), "{}", first.number);
    assert_eq!(
        first.number.split('-').next().unwrap(),
        second.number.split('-').next().unwrap()
    );
    assert!(first.number.ends_with("-100-000001"), "{}", first.number);
    assert!(second.number.ends_with("-100-000002"), "{}", second.number);

    // The business date itself is stored as given
    assert_eq!(first.date.to_rfc3339(), "2019-03-15T12:00:00+00:00");
}

#[tokio::test]
async fn draft_snapshots_product_fields() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;

    let draft = DraftWriter::new(db.clone())
        .create_document(request(VENTA, vec![line(&product_id, 1, 12000)]))
        .await
        .unwrap();

    let mut conn = db.acquire().await.unwrap();
    let items = documents::items_page(&mut conn, &draft.id, 10, 0).await.unwrap();
    assert_eq!(items[0].product_name, "Cafe 500g");
    assert!(items[0].product_code.starts_with("SKU-"));
    assert_eq!(items[0].product_unit.as_deref(), Some("und"));
    // Cost defaults to the product's cached cost
    assert_eq!(items[0].cost_cents, 8000);
}

#[tokio::test]
async fn unknown_references_fail_cleanly() {
    let db = test_db().await;
    let product_id = seed_product(&db, "Cafe 500g", 8000).await;
    let writer = DraftWriter::new(db.clone());

    let err = writer
        .create_document(request("no-such-type", vec![line(&product_id, 1, 1000)]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Document type not found"));

    let err = writer
        .create_document(request(VENTA, vec![line("no-such-product", 1, 1000)]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Product not found"));

    let err = writer
        .create_document(request(VENTA, vec![line(&product_id, 0, 1000)]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("must be positive"));

    let mut req = request(VENTA, vec![line(&product_id, 1, 1000)]);
    req.document_id = "not-a-uuid".to_string();
    let err = writer.create_document(req).await.unwrap_err();
    assert!(err.to_string().contains("invalid format"));
}
