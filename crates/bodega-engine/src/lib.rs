//! # bodega-engine: Document Finalization & Inventory Ledger Services
//!
//! The service layer of the workspace: composes `bodega-core`'s pure logic
//! with `bodega-db`'s repositories into the operations callers use.
//!
//! ## Services
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        bodega-engine                                    │
//! │                                                                         │
//! │  ┌──────────────┐  creates drafts: number, totals, tax rows,           │
//! │  │ DraftWriter  │  product snapshots. No inventory effect.             │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  ┌──────────────┐  posts drafts: stock ± quantity, kardex append,      │
//! │  │  Finalizer   │  cost resolution, clock-out. Idempotent.             │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  ┌──────────────┐  direct AJUSTE appends for stock takes and           │
//! │  │ KardexWriter │  corrections, outside any document.                  │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  ┌──────────────┐  "{year}-{code}-{seq}" allocation, strictly          │
//! │  │  numbering   │  increasing per (type, warehouse, year, month).      │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  Every multi-write operation runs inside ONE SQLite transaction.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use bodega_db::{Database, DbConfig};
//! use bodega_engine::draft::{CreateDocumentRequest, DraftWriter};
//! use bodega_engine::finalize::{FinalizeOptions, Finalizer};
//!
//! # async fn example(request: CreateDocumentRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DbConfig::new("bodega.db")).await?;
//!
//! let draft = DraftWriter::new(db.clone()).create_document(request).await?;
//! let outcome = Finalizer::new(db)
//!     .finalize(&draft.id, Some("user-1"), FinalizeOptions::default())
//!     .await?;
//! println!("posted {} as {}", outcome.posted_lines, outcome.document_number);
//! # Ok(())
//! # }
//! ```

pub mod draft;
pub mod error;
pub mod finalize;
pub mod ledger;
pub mod numbering;

pub use draft::{CreateDocumentRequest, DraftLine, DraftWriter, HeaderDiscount};
pub use error::{EngineError, EngineResult};
pub use finalize::{FinalizeOptions, FinalizeOutcome, FinalizeStatus, Finalizer};
pub use ledger::{AppendRequest, KardexWriter, LedgerEntry};
