//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors                                                │
//! │  ├── CoreError        - General domain errors (this file)              │
//! │  ├── ValidationError  - Input validation failures (this file)          │
//! │  ├── CouponError      - Coupon rule rejections (coupon.rs)             │
//! │  └── CatalogError     - Unresolvable catalog lookups (catalog.rs)      │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storefront-api errors                                                 │
//! │  └── ApiError         - What the client sees (ErrorCode + message)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, code, status)
//! 3. Errors are enum variants, never String
//! 4. Every error that reaches a caller maps to exactly one [`ErrorCode`]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::CartItemStatus;

// =============================================================================
// Error Code Taxonomy
// =============================================================================

/// Machine-readable error codes shared by every caller-facing failure.
///
/// ## Recoverability
/// ```text
/// INVALID_REQUEST     4xx  fix the request; never an incident
/// NOT_FOUND           4xx  unknown / expired / inactive coupon code
/// BELOW_MINIMUM       4xx  cart too small for the coupon
/// NOT_STACKABLE       4xx  conflicts with an already-applied coupon
/// NO_ELIGIBLE_ITEMS   4xx  no cart line matches the coupon's SKU filter
/// PROFILE_NOT_FOUND   404  authenticated, but onboarding not finished
/// UNAUTHENTICATED     401  no valid identity
/// UNKNOWN_ERROR       500  internal failure; detail only in logs
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    NotFound,
    BelowMinimum,
    NotStackable,
    NoEligibleItems,
    ProfileNotFound,
    Unauthenticated,
    UnknownError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BelowMinimum => "BELOW_MINIMUM",
            ErrorCode::NotStackable => "NOT_STACKABLE",
            ErrorCode::NoEligibleItems => "NO_ELIGIBLE_ITEMS",
            ErrorCode::ProfileNotFound => "PROFILE_NOT_FOUND",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart row is not in the status the transition starts from.
    ///
    /// ## When This Occurs
    /// - Reverting a checkout whose rows were already purchased
    /// - Any attempt to move a PURCHASED row
    #[error("Cannot move cart item from {from} to {to}")]
    InvalidTransition {
        from: CartItemStatus,
        to: CartItemStatus,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidTransition { .. }
            | CoreError::CartTooLarge { .. }
            | CoreError::Validation(_) => ErrorCode::InvalidRequest,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Raised at the boundary before any computation runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Too many entries in a list field.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
