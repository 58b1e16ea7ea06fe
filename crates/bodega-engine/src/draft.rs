//! # Draft Writer
//!
//! Creates draft documents: allocates a number, computes totals and tax
//! rows, and freezes product snapshots onto the line items. A draft has
//! NO inventory effect; stock and the kardex only move when the
//! [`crate::finalize::Finalizer`] posts it.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_document (ONE transaction)                                      │
//! │                                                                         │
//! │  1. validate request                                                    │
//! │  2. load document type     → direction, numbering code                  │
//! │  3. allocate number        → "2025-100-000042"                          │
//! │  4. per line:                                                           │
//! │       load product         → snapshot name/code/unit/barcode            │
//! │       resolve taxes        → explicit ids, else the product's taxes     │
//! │       decompose gross      → net + apportioned tax rows                 │
//! │  5. insert header + items + tax rows                                    │
//! │                                                                         │
//! │  Any failure rolls the whole draft back, number included.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::numbering;
use bodega_core::money::Money;
use bodega_core::tax::{self, TaxDecomposition};
use bodega_core::validation::{validate_document_id, validate_quantity, validate_required_id};
use bodega_core::{CoreError, Document, DocumentItem, DocumentItemTax, Tax};
use bodega_db::repository::{documents, products};
use bodega_db::Database;

// =============================================================================
// Request DTOs
// =============================================================================

/// Header-level discount applied to the document total.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum HeaderDiscount {
    /// Flat amount in cents.
    Flat(i64),
    /// Percentage in basis points (1000 = 10%).
    Percent(u32),
}

/// One requested line item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents, as entered (tax-inclusive or not per the
    /// document's pricing policy).
    pub price_cents: i64,
    /// Flat line discount in cents.
    #[serde(default)]
    pub discount_cents: i64,
    /// Explicit unit cost; when absent or zero, the product's cached cost
    /// is used.
    #[serde(default)]
    pub cost_cents: Option<i64>,
    /// Explicit tax ids; when absent, the product's associated taxes apply.
    #[serde(default)]
    pub tax_ids: Option<Vec<String>>,
}

/// A request to create a draft document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    /// Caller-supplied document id; must be a well-formed UUID. Supplied
    /// rather than generated so callers can retry a failed create with the
    /// same identity.
    pub document_id: String,
    pub document_type_id: String,
    pub warehouse_id: String,
    #[serde(default)]
    pub counterparty_id: Option<String>,
    /// Business date; defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub note: Option<String>,
    /// JSON side-channel from the external liquidation tool; the pricing
    /// policy reads `ivaIncludedInCost` from it.
    #[serde(default)]
    pub internal_note: Option<String>,
    #[serde(default)]
    pub discount: Option<HeaderDiscount>,
    pub lines: Vec<DraftLine>,
}

// =============================================================================
// Draft Writer
// =============================================================================

/// Service that creates draft documents.
#[derive(Debug, Clone)]
pub struct DraftWriter {
    db: Database,
}

impl DraftWriter {
    pub fn new(db: Database) -> Self {
        DraftWriter { db }
    }

    /// Creates a draft document in a single transaction.
    ///
    /// Returns the stored document header, with its allocated number and
    /// the computed total.
    pub async fn create_document(
        &self,
        request: CreateDocumentRequest,
    ) -> EngineResult<Document> {
        validate_document_id(&request.document_id)?;
        validate_required_id("documentTypeId", &request.document_type_id)?;
        validate_required_id("warehouseId", &request.warehouse_id)?;
        for line in &request.lines {
            validate_required_id("productId", &line.product_id)?;
            validate_quantity(line.quantity)?;
        }

        let mut tx = self.db.begin().await?;

        let document_type = documents::get_type(&mut *tx, &request.document_type_id)
            .await?
            .ok_or_else(|| {
                CoreError::DocumentTypeNotFound(request.document_type_id.clone())
            })?;

        let now = Utc::now();
        let date = request.date.unwrap_or(now);
        let inclusive = tax::prices_include_tax(
            document_type.stock_direction,
            request.internal_note.as_deref(),
        );

        // Numbering follows the creation instant; a backdated business date
        // never consumes a sequence from a prior (year, month) counter.
        let number =
            numbering::allocate(&mut *tx, &document_type, &request.warehouse_id, now).await?;

        // Build lines in memory first; the header needs the total.
        let mut built: Vec<(DocumentItem, Vec<DocumentItemTax>)> =
            Vec::with_capacity(request.lines.len());
        let mut gross_total = Money::zero();

        let document_id = request.document_id.clone();

        for line in &request.lines {
            let (item, taxes) =
                build_line(&mut *tx, &document_id, line, inclusive, now).await?;
            // The header total is the naive Σ(quantity × price); line
            // discounts only shape each line's gross, the header discount
            // is the only deduction applied here.
            gross_total += Money::from_cents(item.price_cents).multiply_quantity(item.quantity);
            built.push((item, taxes));
        }

        let (total, header_discount_cents) = apply_header_discount(gross_total, request.discount);

        let document = Document {
            id: document_id,
            number,
            document_type_id: request.document_type_id.clone(),
            warehouse_id: request.warehouse_id.clone(),
            counterparty_id: request.counterparty_id.clone(),
            date,
            stock_date: None,
            total_cents: total.cents(),
            discount_cents: header_discount_cents,
            is_paid: request.is_paid,
            note: request.note.clone(),
            internal_note: request.internal_note.clone(),
            is_clocked_out: false,
            created_at: now,
            updated_at: now,
        };

        documents::insert(&mut *tx, &document).await?;
        for (item, item_taxes) in &built {
            documents::insert_item(&mut *tx, item).await?;
            for item_tax in item_taxes {
                documents::insert_item_tax(&mut *tx, item_tax).await?;
            }
        }

        tx.commit().await.map_err(bodega_db::DbError::from)?;

        info!(
            document_id = %document.id,
            number = %document.number,
            lines = built.len(),
            total = %document.total(),
            "Draft document created"
        );

        Ok(document)
    }
}

/// Applies the header discount and returns (final total, discount in cents).
fn apply_header_discount(
    gross_total: Money,
    discount: Option<HeaderDiscount>,
) -> (Money, i64) {
    match discount {
        None => (gross_total, 0),
        Some(HeaderDiscount::Flat(cents)) => {
            (gross_total - Money::from_cents(cents), cents)
        }
        Some(HeaderDiscount::Percent(bps)) => {
            let total = gross_total.apply_percentage_discount(bps);
            (total, (gross_total - total).cents())
        }
    }
}

/// Builds one line item plus its apportioned tax rows.
async fn build_line(
    conn: &mut SqliteConnection,
    document_id: &str,
    line: &DraftLine,
    inclusive: bool,
    now: DateTime<Utc>,
) -> EngineResult<(DocumentItem, Vec<DocumentItemTax>)> {
    let product = products::get(conn, &line.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

    let taxes = resolve_line_taxes(conn, line, &product.id).await?;

    let price = Money::from_cents(line.price_cents);
    let gross = price.multiply_quantity(line.quantity) - Money::from_cents(line.discount_cents);
    let decomposition = tax::decompose(gross, &taxes, inclusive);
    let net_unit = tax::decompose(price, &taxes, inclusive).net;

    let cost_cents = match line.cost_cents {
        Some(cents) if cents > 0 => cents,
        _ => product.cost_cents,
    };

    let item_id = Uuid::new_v4().to_string();
    let item = DocumentItem {
        id: item_id.clone(),
        document_id: document_id.to_string(),
        product_id: product.id.clone(),
        quantity: line.quantity,
        price_cents: line.price_cents,
        net_price_cents: net_unit.cents(),
        discount_cents: line.discount_cents,
        cost_cents,
        product_name: product.name.clone(),
        product_code: product.code.clone(),
        product_unit: product.unit.clone(),
        product_barcode: product.barcode.clone(),
        created_at: now,
    };

    let item_taxes = tax_rows(&item_id, &decomposition);

    debug!(
        product_id = %product.id,
        quantity = line.quantity,
        gross = %gross,
        net = %decomposition.net,
        tax_rows = item_taxes.len(),
        "Built draft line"
    );

    Ok((item, item_taxes))
}

/// Resolves the taxes that apply to a line: explicit ids when given,
/// otherwise the product's associated taxes.
async fn resolve_line_taxes(
    conn: &mut SqliteConnection,
    line: &DraftLine,
    product_id: &str,
) -> EngineResult<Vec<Tax>> {
    match &line.tax_ids {
        Some(ids) => {
            let mut taxes = Vec::with_capacity(ids.len());
            for tax_id in ids {
                // Unknown ids are skipped rather than failing the draft
                if let Some(tax) = products::get_tax(conn, tax_id).await? {
                    taxes.push(tax);
                }
            }
            Ok(taxes)
        }
        None => Ok(products::taxes_for_product(conn, product_id).await?),
    }
}

/// Materializes a decomposition into stored tax rows for a line.
fn tax_rows(item_id: &str, decomposition: &TaxDecomposition) -> Vec<DocumentItemTax> {
    decomposition
        .lines
        .iter()
        .map(|line| DocumentItemTax {
            id: Uuid::new_v4().to_string(),
            document_item_id: item_id.to_string(),
            tax_id: line.tax_id.clone(),
            rate_bps: line.rate.bps() as i64,
            amount_cents: line.amount.cents(),
        })
        .collect()
}
