//! # Validation Module
//!
//! Input validation for sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/server)                                   │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: empty list, quantity, price rules                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Sale transaction (mostrador-db)                              │
//! │  ├── Product existence                                                 │
//! │  └── Stock availability (re-checked inside the transaction)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE sale_number                                                │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::NewSaleItem;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product identifier.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 20 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if id.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 20,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (the caller may omit the price entirely)
pub fn validate_unit_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Request Validator
// =============================================================================

/// Validates a whole sale request before the transaction runs.
///
/// ## Rules
/// - At least one line item
/// - At most MAX_SALE_ITEMS line items
/// - Every item passes the field validators above
///
/// The store re-validates stock inside the transaction; this function only
/// rejects requests that could never succeed.
pub fn validate_sale_items(items: &[NewSaleItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if items.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_SALE_ITEMS,
        });
    }

    for item in items {
        validate_product_id(&item.product_id)?;
        validate_quantity(item.quantity)?;
        validate_unit_price_cents(item.unit_price.cents())?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn item(product_id: &str, quantity: i64, unit_price_cents: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
        }
    }

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("REP-000001").is_ok());
        assert!(validate_product_id("ABC123").is_ok());
        assert!(validate_product_id("part_1").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id("has space").is_err());
        assert!(validate_product_id(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_unit_price_cents() {
        assert!(validate_unit_price_cents(0).is_ok());
        assert!(validate_unit_price_cents(2500).is_ok());
        assert!(validate_unit_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_sale_items_rejects_empty() {
        assert!(matches!(
            validate_sale_items(&[]),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_sale_items_rejects_bad_entries() {
        assert!(validate_sale_items(&[item("REP-000001", 0, 0)]).is_err());
        assert!(validate_sale_items(&[item("", 1, 0)]).is_err());
        assert!(validate_sale_items(&[item("REP-000001", 1, -5)]).is_err());

        // One bad item poisons the whole request
        let items = vec![item("REP-000001", 2, 2500), item("REP-000002", -3, 0)];
        assert!(validate_sale_items(&items).is_err());
    }

    #[test]
    fn test_validate_sale_items_accepts_good_request() {
        let items = vec![item("REP-000001", 3, 2500), item("REP-000002", 1, 0)];
        assert!(validate_sale_items(&items).is_ok());
    }

    #[test]
    fn test_validate_sale_items_rejects_oversized_request() {
        let items: Vec<NewSaleItem> = (0..MAX_SALE_ITEMS + 1)
            .map(|i| item(&format!("REP-{:06}", i), 1, 0))
            .collect();
        assert!(matches!(
            validate_sale_items(&items),
            Err(ValidationError::TooMany { .. })
        ));
    }
}
