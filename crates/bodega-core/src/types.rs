//! # Domain Types
//!
//! Core domain types for the document and inventory ledger subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Document     │   │  DocumentItem   │   │ DocumentItemTax │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  number         │──►│  document_id    │──►│  item_id (FK)   │       │
//! │  │  is_clocked_out │   │  price / net    │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Stock       │   │  KardexEntry    │   │ StockDirection  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  id (sequence)  │   │  In             │       │
//! │  │  warehouse_id   │   │  balance        │   │  Out            │       │
//! │  │  quantity       │   │  prev_balance   │   │  None           │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `number`: human-readable allocated number (`2025-100-000001`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1900 bps = 19% (the common IVA rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Stock Direction
// =============================================================================

/// The inventory effect of a document type.
///
/// ## Semantics
/// - `In`: finalizing adds stock (purchases, entry adjustments)
/// - `Out`: finalizing removes stock (sales, exit adjustments)
/// - `None`: no inventory effect (quotes, service orders) - the finalizer
///   clocks the document out without touching Stock or Kardex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    In,
    Out,
    None,
}

impl Default for StockDirection {
    fn default() -> Self {
        StockDirection::None
    }
}

// =============================================================================
// Kardex Movement
// =============================================================================

/// The movement type of a kardex ledger row.
///
/// Kept in the ledger's traditional Spanish terms: ENTRADA (in),
/// SALIDA (out), AJUSTE (adjustment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum KardexMovement {
    Entrada,
    Salida,
    Ajuste,
}

impl KardexMovement {
    /// The movement recorded when posting a line with the given direction.
    pub fn for_direction(direction: StockDirection) -> Self {
        match direction {
            StockDirection::In => KardexMovement::Entrada,
            StockDirection::Out => KardexMovement::Salida,
            StockDirection::None => KardexMovement::Ajuste,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// A document header: purchase, sale, or adjustment.
///
/// ## Lifecycle
/// ```text
/// DRAFT (is_clocked_out = false)  ──finalize──►  POSTED (is_clocked_out = true)
/// ```
/// The transition happens exactly once. Once posted, the document is
/// immutable to the finalizer; re-finalizing returns success without effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Document {
    pub id: String,
    /// Allocated human-readable number, e.g. `2025-100-000001`.
    pub number: String,
    pub document_type_id: String,
    pub warehouse_id: String,
    pub counterparty_id: Option<String>,
    /// Business date of the document (as entered).
    pub date: DateTime<Utc>,
    /// Posting timestamp - stamped at finalize time, drives ledger ordering.
    pub stock_date: Option<DateTime<Utc>>,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub is_paid: bool,
    /// Free-text note.
    pub note: Option<String>,
    /// JSON side-channel written by the external liquidation tool.
    /// The core reads a single boolean (`ivaIncludedInCost`) from it.
    pub internal_note: Option<String>,
    /// Terminal flag: false → true exactly once.
    pub is_clocked_out: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Returns the header total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Document Item
// =============================================================================

/// A line item in a document.
/// Uses snapshot pattern to freeze product data at draft time, so the
/// document's audit trail survives later product edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentItem {
    pub id: String,
    pub document_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price as entered (may be tax-inclusive).
    pub price_cents: i64,
    /// Derived net-of-tax unit price.
    pub net_price_cents: i64,
    pub discount_cents: i64,
    /// Unit cost. Set at draft time, overwritten at finalize time with the
    /// cost actually posted to the ledger.
    pub cost_cents: i64,
    /// Product name at draft time (frozen).
    pub product_name: String,
    /// Product code at draft time (frozen).
    pub product_code: String,
    /// Unit of measure at draft time (frozen).
    pub product_unit: Option<String>,
    /// First barcode at draft time, if any (frozen).
    pub product_barcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DocumentItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the line's gross amount after the line discount.
    pub fn gross_after_discount(&self) -> Money {
        self.price().multiply_quantity(self.quantity) - Money::from_cents(self.discount_cents)
    }
}

// =============================================================================
// Document Item Tax
// =============================================================================

/// One row per applicable percentage tax per line, holding the apportioned
/// monetary amount. The sum of a line's rows approximates (rounding aside)
/// the tax implied by the line's gross amount and the combined rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentItemTax {
    pub id: String,
    pub document_item_id: String,
    pub tax_id: String,
    /// Rate snapshot at draft time.
    pub rate_bps: i64,
    pub amount_cents: i64,
}

// =============================================================================
// Document Type
// =============================================================================

/// Reference data: supplies the stock direction and the short code used in
/// document number formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentType {
    pub id: String,
    pub name: String,
    /// Short code embedded in document numbers ("100", "200", ...).
    pub code: Option<String>,
    pub stock_direction: StockDirection,
}

impl DocumentType {
    /// Code used when formatting document numbers; `"000"` when missing.
    pub fn numbering_code(&self) -> &str {
        self.code.as_deref().unwrap_or("000")
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Current-quantity projection per (product, warehouse).
///
/// Conceptually the running sum of all signed kardex quantities for the key,
/// but maintained as a mutable projection rather than derived on read.
/// Only the finalizer writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Stock {
    pub product_id: String,
    pub warehouse_id: String,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Kardex
// =============================================================================

/// An immutable inventory movement ledger row. Append-only: once written,
/// never updated or deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct KardexEntry {
    /// Sequence-allocated integer id.
    pub id: i64,
    pub product_id: String,
    pub warehouse_id: String,
    pub movement: KardexMovement,
    /// Quantity moved (always positive; the movement type carries the sign).
    pub quantity: i64,
    /// Balance after the movement.
    pub balance: i64,
    /// Balance before the movement.
    pub previous_balance: i64,
    pub unit_cost_cents: i64,
    pub total_cost_cents: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub document_id: Option<String>,
    pub document_number: Option<String>,
    pub user_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit row created alongside a kardex row when the acting user is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct KardexHistory {
    pub id: i64,
    pub kardex_id: i64,
    pub product_id: String,
    pub previous_balance: i64,
    pub new_balance: i64,
    pub user_id: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product / Tax (reference, read-mostly)
// =============================================================================

/// A product. The ledger core reads cost, last-purchase price, and the
/// service flag; IN postings roll the posted cost forward onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub code: String,
    pub barcode: Option<String>,
    pub unit: Option<String>,
    pub cost_cents: i64,
    pub last_purchase_price_cents: i64,
    /// Service products are excluded from all inventory effects.
    pub is_service: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A percentage or fixed-amount tax definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tax {
    pub id: String,
    pub name: String,
    pub rate_bps: i64,
    /// Fixed-amount taxes are excluded from percentage apportionment.
    pub is_fixed: bool,
    pub is_enabled: bool,
}

impl Tax {
    /// Whether this tax participates in percentage apportionment.
    pub fn is_applicable_percentage(&self) -> bool {
        self.is_enabled && !self.is_fixed && self.rate_bps > 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1900);
        assert_eq!(rate.bps(), 1900);
        assert!((rate.percentage() - 19.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
    }

    #[test]
    fn test_movement_for_direction() {
        assert_eq!(
            KardexMovement::for_direction(StockDirection::In),
            KardexMovement::Entrada
        );
        assert_eq!(
            KardexMovement::for_direction(StockDirection::Out),
            KardexMovement::Salida
        );
    }

    #[test]
    fn test_numbering_code_default() {
        let ty = DocumentType {
            id: "t1".into(),
            name: "Venta".into(),
            code: None,
            stock_direction: StockDirection::Out,
        };
        assert_eq!(ty.numbering_code(), "000");
    }

    #[test]
    fn test_applicable_percentage() {
        let iva = Tax {
            id: "iva".into(),
            name: "IVA".into(),
            rate_bps: 1900,
            is_fixed: false,
            is_enabled: true,
        };
        assert!(iva.is_applicable_percentage());

        let fixed = Tax { is_fixed: true, ..iva.clone() };
        assert!(!fixed.is_applicable_percentage());

        let disabled = Tax { is_enabled: false, ..iva.clone() };
        assert!(!disabled.is_applicable_percentage());

        let zero = Tax { rate_bps: 0, ..iva };
        assert!(!zero.is_applicable_percentage());
    }

    #[test]
    fn test_gross_after_discount() {
        let item = DocumentItem {
            id: "i1".into(),
            document_id: "d1".into(),
            product_id: "p1".into(),
            quantity: 3,
            price_cents: 1000,
            net_price_cents: 1000,
            discount_cents: 500,
            cost_cents: 0,
            product_name: "Cafe".into(),
            product_code: "CAFE-500".into(),
            product_unit: None,
            product_barcode: None,
            created_at: Utc::now(),
        };
        assert_eq!(item.gross_after_discount().cents(), 2500);
    }
}
