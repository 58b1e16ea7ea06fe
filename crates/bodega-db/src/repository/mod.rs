//! # Repository Modules
//!
//! Data access functions, one module per aggregate.
//!
//! ## Module Organization
//! ```text
//! repository/
//! ├── counters.rs   - Named sequences + document number counters
//! ├── documents.rs  - Documents, items, item taxes, document types
//! ├── products.rs   - Products, taxes, product-tax associations
//! ├── stock.rs      - Current-quantity projection per (product, warehouse)
//! ├── kardex.rs     - Append-only movement ledger + audit history
//! └── settings.rs   - Key/value policy settings
//! ```
//!
//! ## Connection-Passing Style
//! Every function takes `&mut SqliteConnection` instead of holding a pool.
//! That lets the engine compose many repository calls on one transaction
//! (`Database::begin`), which is what makes draft creation and finalize
//! posting all-or-nothing. Callers outside a transaction acquire a
//! connection with `Database::acquire`.

pub mod counters;
pub mod documents;
pub mod kardex;
pub mod products;
pub mod settings;
pub mod stock;
