//! # bodega-core: Pure Business Logic for Bodega
//!
//! This crate is the **heart** of the document and inventory ledger
//! subsystem. It contains all business logic as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bodega Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               bodega-engine (Services)                          │   │
//! │  │    DraftWriter ──► Finalizer ──► KardexWriter ──► Numbering    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bodega-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    tax    │  │ validation│  │   │
//! │  │   │ Document  │  │   Money   │  │ decompose │  │   rules   │  │   │
//! │  │   │  Kardex   │  │  TaxRate  │  │ apportion │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bodega-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Document, KardexEntry, Product, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tax`] - Tax decomposition and apportionment (the Cost & Tax Resolver)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bodega_core::money::Money;
//! use bodega_core::tax::decompose;
//! use bodega_core::types::Tax;
//!
//! // Decompose a tax-inclusive shelf price
//! let iva = Tax {
//!     id: "iva".into(),
//!     name: "IVA".into(),
//!     rate_bps: 1900,
//!     is_fixed: false,
//!     is_enabled: true,
//! };
//! let result = decompose(Money::from_cents(11900), &[iva], true);
//! assert_eq!(result.net.cents(), 10000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bodega_core::Money` instead of
// `use bodega_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Zero-padding width of the sequence part of a document number.
///
/// ## Why a constant?
/// Document numbers like `2025-100-000001` must sort lexicographically in the
/// same order they were allocated; a fixed width guarantees that up to a
/// million documents per (type, warehouse, month).
pub const DOCUMENT_NUMBER_PAD: usize = 6;

/// Page size used when loading document items at finalize time.
///
/// ## Business Reason
/// Item loads are paginated to completion and concatenated; a finalize must
/// never silently stop at a page boundary.
pub const ITEM_PAGE_SIZE: i64 = 100;
