//! # Bodega Database Layer
//!
//! SQLite persistence for the bodega inventory and document system.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         bodega-db                                       │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌─────────────────────────┐ │
//! │  │  pool        │   │  migrations      │   │  repository             │ │
//! │  │  DbConfig    │──▶│  embedded .sql   │   │  counters  documents    │ │
//! │  │  Database    │   │  (sqlx migrate)  │   │  products  stock        │ │
//! │  └──────────────┘   └──────────────────┘   │  kardex    settings     │ │
//! │                                            └─────────────────────────┘ │
//! │                                                                         │
//! │  Repository functions take &mut SqliteConnection so callers choose     │
//! │  the transaction boundary. bodega-engine composes them inside          │
//! │  Database::begin() transactions.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain types live in `bodega-core`; this crate maps them to and from
//! SQLite rows and owns the connection pool.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
