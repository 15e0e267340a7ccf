//! # storefront-core: Pure Pricing Logic for the Storefront
//!
//! This crate is the **heart** of the storefront's order pricing. It contains
//! the promotion and cart-settlement rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Pricing Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront client                            │   │
//! │  │    Cart UI ──► Coupon box ──► Checkout ──► Receipt              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storefront-api (axum)                        │   │
//! │  │    /bogo, /coupon/apply, /coupon/auto-apply, /cart/checkout     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   bogo    │  │  coupon   │  │  pricing  │  │   │
//! │  │   │   Money   │  │  pairing  │  │ validate  │  │ breakdown │  │   │
//! │  │   │ rounding  │  │  engine   │  │ auto-pick │  │  policy   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-db (Database Layer)                  │   │
//! │  │       cart state machine, catalog snapshots, profiles           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (CartLine, Coupon, CartItem, etc.)
//! - [`error`] - Domain error types and the public error-code taxonomy
//! - [`validation`] - Boundary validation rules
//! - [`catalog`] - Read-only promotion catalog snapshot
//! - [`bogo`] - Buy-one-get-one pairing engine
//! - [`coupon`] - Coupon rule evaluator
//! - [`pricing`] - Orchestrator producing the final breakdown
//! - [`messages`] - Bilingual (en/he) user-facing messages
//! - [`cache`] - TTL cache used for per-session coupon state
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart + same catalog snapshot = same breakdown
//! 2. **No I/O**: callers pass the clock (`now`) and the catalog in
//! 3. **Integer Money**: all monetary values are minor units (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::bogo::compute_bogo;
//! use storefront_core::catalog::CatalogSnapshot;
//! use storefront_core::{CartLine, Money, PromotionGroup};
//!
//! let mut catalog = CatalogSnapshot::new();
//! catalog.assign_group("SHIRT-A", PromotionGroup::new("tees", Money::from_cents(450)));
//! catalog.assign_group("SHIRT-B", PromotionGroup::new("tees", Money::from_cents(450)));
//!
//! let lines = vec![
//!     CartLine::new("SHIRT-A", 1, Money::from_cents(300)),
//!     CartLine::new("SHIRT-B", 1, Money::from_cents(250)),
//! ];
//!
//! let result = compute_bogo(&lines, &catalog);
//! assert_eq!(result.bogo_discount_amount.cents(), 100);
//! assert_eq!(result.discounted_total_eligible.cents(), 450);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bogo;
pub mod cache;
pub mod catalog;
pub mod coupon;
pub mod error;
pub mod messages;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use storefront_core::Money` instead of
// `use storefront_core::money::Money`

pub use error::{CoreError, ErrorCode, ValidationError};
pub use messages::LocalizedMessage;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart snapshot.
///
/// ## Business Reason
/// Prevents runaway carts and bounds the BOGO expansion work per request.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit or sale price of a line, in agorot (₪100,000,000).
///
/// ## Business Reason
/// Keeps every cart total inside `i64`: 100 lines × 999 units × this bound
/// is about 10^15 agorot.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum number of already-applied coupon codes a request may carry.
pub const MAX_EXISTING_COUPONS: usize = 10;
