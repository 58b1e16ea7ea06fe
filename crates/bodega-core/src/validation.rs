//! # Validation Module
//!
//! Input validation for draft and finalize requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller                                                       │
//! │  └── Supplies well-formed ids and quantities                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Rejects malformed input before any write happens                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE / PRIMARY KEY constraints                                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a caller-supplied document id.
///
/// ## Rules
/// - Must not be empty
/// - Must be a well-formed UUID (the draft writer never generates ids;
///   the caller supplies them so retries stay idempotent on its side)
///
/// ## Example
/// ```rust
/// use bodega_core::validation::validate_document_id;
///
/// assert!(validate_document_id("6f9619ff-8b86-4d01-b42d-00cf4fc964ff").is_ok());
/// assert!(validate_document_id("").is_err());
/// assert!(validate_document_id("not-a-uuid").is_err());
/// ```
pub fn validate_document_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "documentId".to_string(),
        });
    }

    if Uuid::parse_str(id).is_err() {
        return Err(ValidationError::InvalidFormat {
            field: "documentId".to_string(),
            reason: "must be a well-formed UUID".to_string(),
        });
    }

    Ok(())
}

/// Validates that a referenced entity id is present.
pub fn validate_required_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (the movement type carries the sign, never the
///   quantity itself)
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id("6f9619ff-8b86-4d01-b42d-00cf4fc964ff").is_ok());
        assert!(validate_document_id("  6f9619ff-8b86-4d01-b42d-00cf4fc964ff  ").is_ok());
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id("   ").is_err());
        assert!(validate_document_id("12345").is_err());
    }

    #[test]
    fn test_validate_required_id() {
        assert!(validate_required_id("warehouseId", "w1").is_ok());
        assert!(validate_required_id("warehouseId", "").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }
}
