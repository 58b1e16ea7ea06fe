//! Engine error type: the public error surface of draft, finalize, and
//! ledger operations. Wraps core business errors and database failures.

use thiserror::Error;

use bodega_core::{CoreError, ValidationError};
use bodega_db::DbError;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation (not found, insufficient stock, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database failure.
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
