//! # Validation Module
//!
//! Boundary validation for every request that enters the pricing engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request schema (serde, deny_unknown_fields)                  │
//! │  └── Wrong shape / wrong types → INVALID_REQUEST                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── SKU / code / order id formats                                     │
//! │  └── quantity and price ranges, list sizes                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on status and quantity                          │
//! │  └── Trigger guarding PURCHASED rows                                   │
//! │                                                                         │
//! │  Fail fast: nothing is computed or written until layers 1-2 pass       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_sku, validate_coupon_code};
//!
//! assert!(validate_sku("TEE-RED-01").is_ok());
//! assert_eq!(validate_coupon_code(" save10 ").unwrap(), "SAVE10");
//! ```

use crate::error::ValidationError;
use crate::types::CartLine;
use crate::{MAX_CART_ITEMS, MAX_EXISTING_COUPONS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_SKU_LEN: usize = 50;
const MAX_SLUG_LEN: usize = 40;
const MAX_COUPON_CODE_LEN: usize = 32;
const MAX_ORDER_ID_LEN: usize = 64;

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Shared rule for SKU-like tokens: non-empty, bounded, `[A-Za-z0-9_-]`.
fn validate_token(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value.chars().all(is_token_char) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_sku;
///
/// assert!(validate_sku("TEE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_token("sku", sku.trim(), MAX_SKU_LEN)
}

/// Validates an optional colour or size slug.
pub fn validate_slug(field: &str, slug: Option<&str>) -> ValidationResult<()> {
    match slug {
        Some(s) => validate_token(field, s, MAX_SLUG_LEN),
        None => Ok(()),
    }
}

/// Validates and normalizes a coupon code.
///
/// ## Returns
/// The trimmed, upper-cased code. Coupon lookups are case-insensitive, so
/// every code is compared in this canonical form.
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    validate_token("code", code, MAX_COUPON_CODE_LEN)?;
    Ok(code.to_ascii_uppercase())
}

/// Validates the list of coupon codes already applied to the cart.
///
/// ## Returns
/// The normalized codes, in input order.
pub fn validate_existing_codes(codes: &[String]) -> ValidationResult<Vec<String>> {
    if codes.len() > MAX_EXISTING_COUPONS {
        return Err(ValidationError::TooMany {
            field: "existingCouponCodes".to_string(),
            max: MAX_EXISTING_COUPONS,
        });
    }

    codes.iter().map(|c| validate_coupon_code(c)).collect()
}

/// Validates a provisional order identifier supplied by the caller.
pub fn validate_order_id(order_id: &str) -> ValidationResult<()> {
    validate_token("orderId", order_id, MAX_ORDER_ID_LEN)
}

/// Validates a cart item id (UUID).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of a pricing line.
///
/// ## Rules
/// - 0 is allowed (a logical no-op line)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a quantity being added to a persisted cart.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_add_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - Must not exceed MAX_PRICE_CENTS (₪100,000,000)
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a whole cart snapshot before it reaches the engine.
///
/// ## Rules
/// - At most MAX_CART_ITEMS (100) lines
/// - Every line has a valid SKU, slugs, quantity and prices
pub fn validate_cart_lines(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.len() > MAX_CART_ITEMS {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_CART_ITEMS,
        });
    }

    for line in lines {
        validate_sku(&line.sku)?;
        validate_line_quantity(line.quantity)?;
        validate_price_cents("unitPrice", line.unit_price.cents())?;
        if let Some(sale) = line.sale_price {
            validate_price_cents("salePrice", sale.cents())?;
        }
        validate_slug("color", line.color.as_deref())?;
        validate_slug("size", line.size.as_deref())?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TEE-330").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_coupon_code_is_normalized() {
        assert_eq!(validate_coupon_code("summer-25").unwrap(), "SUMMER-25");
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("50%OFF").is_err());
        assert!(validate_coupon_code(&"X".repeat(33)).is_err());
    }

    #[test]
    fn test_existing_codes_limit() {
        let codes: Vec<String> = (0..11).map(|i| format!("C{i}")).collect();
        assert!(matches!(
            validate_existing_codes(&codes),
            Err(ValidationError::TooMany { .. })
        ));
        assert_eq!(
            validate_existing_codes(&["a".to_string()]).unwrap(),
            vec!["A".to_string()]
        );
    }

    #[test]
    fn test_line_quantity_allows_zero() {
        assert!(validate_line_quantity(0).is_ok());
        assert!(validate_line_quantity(999).is_ok());
        assert!(validate_line_quantity(-1).is_err());
        assert!(validate_line_quantity(1000).is_err());
    }

    #[test]
    fn test_add_quantity_must_be_positive() {
        assert!(validate_add_quantity(1).is_ok());
        assert!(validate_add_quantity(0).is_err());
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price_cents("unitPrice", 0).is_ok());
        assert!(validate_price_cents("unitPrice", MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price_cents("unitPrice", MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(validate_price_cents("salePrice", -1).is_err());
    }

    #[test]
    fn test_overflowing_line_is_rejected() {
        let line = CartLine::new("MUG", 2, Money::from_cents(i64::MAX / 2 + 1));
        assert!(validate_cart_lines(&[line]).is_err());

        let on_sale = CartLine::new("MUG", 2, Money::from_cents(100)).with_sale_price(Money::from_cents(i64::MAX));
        assert!(validate_cart_lines(&[on_sale]).is_err());
    }

    #[test]
    fn test_validate_cart_lines() {
        let good = vec![CartLine::new("TEE", 2, Money::from_cents(300))];
        assert!(validate_cart_lines(&good).is_ok());

        let negative_price = vec![CartLine::new("TEE", 1, Money::from_cents(-1))];
        assert!(validate_cart_lines(&negative_price).is_err());

        let mut navy = CartLine::new("TEE", 1, Money::from_cents(1));
        navy.color = Some("navy blue".to_string());
        let bad_slug = vec![navy];
        assert!(validate_cart_lines(&bad_slug).is_err());

        let too_many: Vec<CartLine> = (0..101)
            .map(|i| CartLine::new(format!("SKU-{i}"), 1, Money::from_cents(100)))
            .collect();
        assert!(validate_cart_lines(&too_many).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_order_id() {
        assert!(validate_order_id("ord_2026_0001").is_ok());
        assert!(validate_order_id("").is_err());
        assert!(validate_order_id("ord/1").is_err());
    }
}
