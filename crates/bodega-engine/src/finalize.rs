//! # Finalizer
//!
//! Posts a draft document: mutates stock and appends kardex ledger rows,
//! then clocks the document out. The single most sensitive operation in
//! the system.
//!
//! ## Posting Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  finalize (ONE transaction)                                             │
//! │                                                                         │
//! │  1. load document          → already clocked out? return, no effects    │
//! │  2. load type, stamp stock_date (posting time drives ledger ordering)   │
//! │  3. direction NONE?        → clock out only, no inventory logic         │
//! │  4. load ALL items         → paged to completion, never a prefix        │
//! │  5. pre-validate stock     → OUT + no-negative policy + no clamp:       │
//! │                              fail with nothing committed                │
//! │  6. per line:                                                           │
//! │       skip services                                                     │
//! │       clamp (opt-in)       → posted = max(0, min(requested, current))   │
//! │       resolve unit cost    → cascade (see resolve_unit_cost)            │
//! │       stock: current ± posted                                           │
//! │       kardex: append row (prev balance, new balance, costs, prices)     │
//! │       IN: roll product cost forward                                     │
//! │  7. clock out (conditional UPDATE)                                      │
//! │  8. commit                                                              │
//! │                                                                         │
//! │  Every failure before commit rolls everything back: a finalize is      │
//! │  all-or-nothing.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::ledger;
use bodega_core::validation::validate_document_id;
use bodega_core::money::Money;
use bodega_core::{
    CoreError, Document, DocumentItem, KardexMovement, Product, StockDirection, ITEM_PAGE_SIZE,
};
use bodega_db::repository::{documents, kardex, products, settings, stock};
use bodega_db::Database;

// =============================================================================
// Options & Outcome
// =============================================================================

/// Caller-selected behavior for a finalize run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizeOptions {
    /// Clamp OUT quantities to available stock instead of failing: each
    /// line posts `max(0, min(requested, current))` and its monetary
    /// amounts are prorated by posted/requested.
    pub clamp_to_available: bool,
    /// Allow stock to go negative for this run regardless of the stored
    /// `allow_negative_stock` setting.
    pub force_allow_negative: bool,
}

/// How a finalize run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeStatus {
    /// This call performed the posting.
    Finalized,
    /// The document was already clocked out; nothing changed.
    AlreadyFinalized,
}

/// Result of a finalize run.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub status: FinalizeStatus,
    pub document_number: String,
    /// Lines that produced a ledger entry.
    pub posted_lines: usize,
    /// Lines skipped: services, or clamped all the way to zero.
    pub skipped_lines: usize,
}

// =============================================================================
// Finalizer
// =============================================================================

/// Service that posts draft documents to stock and the kardex.
///
/// The only writer of Stock and Kardex rows besides the standalone
/// adjustment path in [`crate::ledger`].
#[derive(Debug, Clone)]
pub struct Finalizer {
    db: Database,
}

impl Finalizer {
    pub fn new(db: Database) -> Self {
        Finalizer { db }
    }

    /// Finalizes a draft document.
    ///
    /// Idempotent: finalizing an already-posted document returns
    /// `AlreadyFinalized` without touching stock or the ledger.
    pub async fn finalize(
        &self,
        document_id: &str,
        user_id: Option<&str>,
        options: FinalizeOptions,
    ) -> EngineResult<FinalizeOutcome> {
        validate_document_id(document_id)?;

        let mut tx = self.db.begin().await?;

        let document = documents::get(&mut *tx, document_id)
            .await?
            .ok_or_else(|| CoreError::DocumentNotFound(document_id.to_string()))?;

        if document.is_clocked_out {
            debug!(document_id, number = %document.number, "Document already finalized");
            return Ok(FinalizeOutcome {
                status: FinalizeStatus::AlreadyFinalized,
                document_number: document.number,
                posted_lines: 0,
                skipped_lines: 0,
            });
        }

        let document_type = documents::get_type(&mut *tx, &document.document_type_id)
            .await?
            .ok_or_else(|| {
                CoreError::DocumentTypeNotFound(document.document_type_id.clone())
            })?;
        let direction = document_type.stock_direction;

        // Posting time, not the document's business date, drives ledger
        // ordering. Inside the transaction the stamp rolls back with
        // everything else if the finalize fails.
        let stock_date = Utc::now();
        documents::set_stock_date(&mut *tx, document_id, stock_date).await?;

        // NONE documents clock out with no inventory effect at all
        if direction == StockDirection::None {
            let transitioned = documents::clock_out(&mut *tx, document_id).await?;
            tx.commit().await.map_err(bodega_db::DbError::from)?;
            info!(document_id, number = %document.number, "Document clocked out (no stock effect)");
            return Ok(FinalizeOutcome {
                status: if transitioned {
                    FinalizeStatus::Finalized
                } else {
                    FinalizeStatus::AlreadyFinalized
                },
                document_number: document.number,
                posted_lines: 0,
                skipped_lines: 0,
            });
        }

        let items = load_all_items(&mut *tx, document_id).await?;
        let product_cache = load_products(&mut *tx, &items).await?;

        let allow_negative = options.force_allow_negative
            || settings::get_bool(&mut *tx, settings::ALLOW_NEGATIVE_STOCK, true).await?;

        if direction == StockDirection::Out && !allow_negative && !options.clamp_to_available {
            validate_stock_available(&mut *tx, &document, &items, &product_cache).await?;
        }

        let mut posted_lines = 0usize;
        let mut skipped_lines = 0usize;
        // Cached per product: the last-ENTRADA cost lookup is the slowest
        // step of the cascade and repeats across lines of the same product.
        let mut entrada_cost_cache: HashMap<String, Option<i64>> = HashMap::new();
        // Products whose cached cost was rolled forward earlier in this run
        let mut rolled_costs: HashMap<String, i64> = HashMap::new();

        for item in &items {
            let product = product_cache
                .get(&item.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if product.is_service {
                skipped_lines += 1;
                continue;
            }

            let current = stock::get(&mut *tx, &item.product_id, &document.warehouse_id)
                .await?
                .map(|s| s.quantity)
                .unwrap_or(0);

            let requested = item.quantity;
            let posted = if direction == StockDirection::Out && options.clamp_to_available {
                requested.min(current).max(0)
            } else {
                requested
            };

            if posted == 0 {
                warn!(
                    document_id,
                    product_id = %item.product_id,
                    requested,
                    current,
                    "Line clamped to zero, skipping"
                );
                skipped_lines += 1;
                continue;
            }

            if posted < requested {
                warn!(
                    document_id,
                    product_id = %item.product_id,
                    requested,
                    posted,
                    "Line clamped to available stock"
                );
            }

            let unit_cost = resolve_unit_cost(
                &mut *tx,
                direction,
                item,
                product,
                &document.warehouse_id,
                &rolled_costs,
                &mut entrada_cost_cache,
            )
            .await?;

            let new_balance = match direction {
                StockDirection::In => current + posted,
                StockDirection::Out => current - posted,
                StockDirection::None => current,
            };

            stock::upsert_quantity(
                &mut *tx,
                &item.product_id,
                &document.warehouse_id,
                new_balance,
            )
            .await?;

            // The clamped share of the line's value, never the full amount.
            // Both the unit and the total price carry the posted/requested
            // fraction.
            let unit_price = Money::from_cents(item.price_cents).prorate(posted, requested);
            let total_price = item.gross_after_discount().prorate(posted, requested);

            ledger::append(
                &mut *tx,
                ledger::LedgerEntry {
                    product_id: item.product_id.clone(),
                    warehouse_id: document.warehouse_id.clone(),
                    movement: KardexMovement::for_direction(direction),
                    quantity: posted,
                    balance: new_balance,
                    // Stock was just mutated above; re-reading it here
                    // would observe the post-movement quantity
                    previous_balance: Some(current),
                    unit_cost_cents: unit_cost,
                    total_cost_cents: unit_cost * posted,
                    unit_price_cents: unit_price.cents(),
                    total_price_cents: total_price.cents(),
                    document_id: Some(document.id.clone()),
                    document_number: Some(document.number.clone()),
                    user_id: user_id.map(str::to_string),
                    note: None,
                    created_at: stock_date,
                },
            )
            .await?;

            if unit_cost > 0 {
                documents::set_item_cost(&mut *tx, &item.id, unit_cost).await?;
            }

            if direction == StockDirection::In && unit_cost > 0 {
                products::roll_forward_cost(&mut *tx, &item.product_id, unit_cost).await?;
                rolled_costs.insert(item.product_id.clone(), unit_cost);
            }

            posted_lines += 1;
        }

        if !documents::clock_out(&mut *tx, document_id).await? {
            // The flag flipped under us; drop the transaction so none of
            // the postings above survive.
            drop(tx);
            return Ok(FinalizeOutcome {
                status: FinalizeStatus::AlreadyFinalized,
                document_number: document.number,
                posted_lines: 0,
                skipped_lines: 0,
            });
        }

        tx.commit().await.map_err(bodega_db::DbError::from)?;

        info!(
            document_id,
            number = %document.number,
            direction = ?direction,
            posted_lines,
            skipped_lines,
            "Document finalized"
        );

        Ok(FinalizeOutcome {
            status: FinalizeStatus::Finalized,
            document_number: document.number,
            posted_lines,
            skipped_lines,
        })
    }
}

// =============================================================================
// Posting Helpers
// =============================================================================

/// Loads every line of a document, paging to completion.
async fn load_all_items(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> EngineResult<Vec<DocumentItem>> {
    let mut items = Vec::new();
    let mut offset = 0i64;
    loop {
        let page = documents::items_page(conn, document_id, ITEM_PAGE_SIZE, offset).await?;
        let got = page.len() as i64;
        items.extend(page);
        if got < ITEM_PAGE_SIZE {
            break;
        }
        offset += got;
    }
    Ok(items)
}

/// Loads each distinct product referenced by the lines.
async fn load_products(
    conn: &mut SqliteConnection,
    items: &[DocumentItem],
) -> EngineResult<HashMap<String, Product>> {
    let mut cache = HashMap::new();
    for item in items {
        if cache.contains_key(&item.product_id) {
            continue;
        }
        let product = products::get(conn, &item.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
        cache.insert(item.product_id.clone(), product);
    }
    Ok(cache)
}

/// Pre-validates that an OUT document can post every line without driving
/// stock negative. Quantities are aggregated per product first, so several
/// lines of the same product are checked against the shared balance.
async fn validate_stock_available(
    conn: &mut SqliteConnection,
    document: &Document,
    items: &[DocumentItem],
    product_cache: &HashMap<String, Product>,
) -> EngineResult<()> {
    let mut requested_per_product: HashMap<&str, i64> = HashMap::new();
    for item in items {
        let product = product_cache
            .get(&item.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
        if product.is_service {
            continue;
        }
        *requested_per_product.entry(item.product_id.as_str()).or_default() += item.quantity;
    }

    for (product_id, requested) in requested_per_product {
        let current = stock::get(conn, product_id, &document.warehouse_id)
            .await?
            .map(|s| s.quantity)
            .unwrap_or(0);
        if current - requested < 0 {
            let product = &product_cache[product_id];
            return Err(EngineError::Core(CoreError::InsufficientStock {
                product: product.name.clone(),
                current,
                requested,
            }));
        }
    }

    Ok(())
}

/// Resolves the unit cost to post for a line.
///
/// ## Cascade
/// ```text
/// line cost (> 0)
/// └─► cost rolled forward earlier in THIS run (same product)
///     ├─► IN:  product cached cost
///     └─► OUT: product last purchase price (> 0)
///              └─► product cached cost (> 0)
///                  └─► unit cost of the last ENTRADA ledger row
///                      └─► 0
/// ```
///
/// The rolled-forward lookup precedes the cached-cost fallbacks: a later
/// costless line of the same product resolves to the value rolled earlier
/// in the run, not the stale cached one.
async fn resolve_unit_cost(
    conn: &mut SqliteConnection,
    direction: StockDirection,
    item: &DocumentItem,
    product: &Product,
    warehouse_id: &str,
    rolled_costs: &HashMap<String, i64>,
    entrada_cost_cache: &mut HashMap<String, Option<i64>>,
) -> EngineResult<i64> {
    if item.cost_cents > 0 {
        return Ok(item.cost_cents);
    }

    if let Some(&cost) = rolled_costs.get(&product.id) {
        return Ok(cost);
    }

    if direction == StockDirection::In {
        return Ok(product.cost_cents);
    }

    if product.last_purchase_price_cents > 0 {
        return Ok(product.last_purchase_price_cents);
    }
    if product.cost_cents > 0 {
        return Ok(product.cost_cents);
    }

    let cached = match entrada_cost_cache.get(&product.id) {
        Some(cost) => *cost,
        None => {
            let cost = kardex::last_entrada_unit_cost(conn, &product.id, warehouse_id).await?;
            entrada_cost_cache.insert(product.id.clone(), cost);
            cost
        }
    };

    Ok(cached.unwrap_or(0))
}
