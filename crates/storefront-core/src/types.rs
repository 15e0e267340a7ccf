//! # Domain Types
//!
//! Core domain types used throughout the storefront pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Ephemeral (per request)          Catalog-owned (read-only snapshot)    │
//! │  ┌─────────────────┐              ┌─────────────────┐                   │
//! │  │    CartLine     │              │ PromotionGroup  │                   │
//! │  │  sku, quantity  │──group of──► │  group_id       │                   │
//! │  │  unit/sale price│    sku       │  fixed_pair_price│                  │
//! │  └─────────────────┘              └─────────────────┘                   │
//! │  ┌─────────────────┐              ┌─────────────────┐                   │
//! │  │    BogoPair     │              │     Coupon      │                   │
//! │  │  never stored   │              │  code | auto    │                   │
//! │  └─────────────────┘              │  DiscountSpec   │                   │
//! │                                   └─────────────────┘                   │
//! │  Persisted (owned by one user)                                          │
//! │  ┌──────────────────────────────────────────────────┐                   │
//! │  │  CartItem  status: IN_CART → CHECKED_OUT → PURCHASED                 │
//! │  └──────────────────────────────────────────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Cart Line
// =============================================================================

/// One distinct SKU + variant requested by the customer.
///
/// Quantity 0 is a logical no-op: it contributes nothing anywhere but is not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl CartLine {
    /// Creates a line with no sale price and no variant.
    pub fn new(sku: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        CartLine {
            sku: sku.into(),
            quantity,
            unit_price,
            sale_price: None,
            color: None,
            size: None,
        }
    }

    /// Sets the sale price.
    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    /// The price one unit actually sells for: the sale price when present
    /// and lower, else the unit price.
    pub fn effective_unit_price(&self) -> Money {
        match self.sale_price {
            Some(sale) if sale < self.unit_price => sale,
            _ => self.unit_price,
        }
    }

    /// Effective unit price × quantity. Zero for quantity 0.
    pub fn line_total(&self) -> Money {
        self.effective_unit_price()
            .multiply_quantity(self.quantity.max(0))
    }
}

// =============================================================================
// Promotion Group
// =============================================================================

/// A named bucket of SKUs that pair together for one fixed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionGroup {
    pub group_id: String,
    pub fixed_pair_price: Money,
}

impl PromotionGroup {
    pub fn new(group_id: impl Into<String>, fixed_pair_price: Money) -> Self {
        PromotionGroup {
            group_id: group_id.into(),
            fixed_pair_price,
        }
    }
}

// =============================================================================
// BOGO Pair
// =============================================================================

/// Two units paired under one promotion group. Produced per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BogoPair {
    pub group_id: String,
    pub sku_a: String,
    pub sku_b: String,
    pub original_sum: Money,
    pub pair_price: Money,
    /// `max(0, original_sum - pair_price)`
    pub discount: Money,
}

// =============================================================================
// Coupons
// =============================================================================

/// Which cart lines a coupon's discount applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "skus", rename_all = "snake_case")]
pub enum SkuFilter {
    /// Every line in the cart.
    All,
    /// Only lines whose SKU is in the set.
    Skus(BTreeSet<String>),
}

impl SkuFilter {
    /// Builds an SKU list filter.
    pub fn skus<I, S>(skus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SkuFilter::Skus(skus.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, sku: &str) -> bool {
        match self {
            SkuFilter::All => true,
            SkuFilter::Skus(set) => set.contains(sku),
        }
    }
}

/// How a coupon's discount is computed from the eligible subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountSpec {
    /// Basis points of the eligible subtotal (1500 = 15%).
    Percentage { bps: u32 },
    /// A fixed amount, capped at the eligible subtotal.
    Fixed { amount: Money },
}

/// When a coupon may be used. `ends_at` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl ActiveWindow {
    pub fn open_from(starts_at: DateTime<Utc>) -> Self {
        ActiveWindow {
            starts_at,
            ends_at: None,
        }
    }

    pub fn between(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        ActiveWindow {
            starts_at,
            ends_at: Some(ends_at),
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.map_or(true, |end| now < end)
    }
}

/// A coupon as owned by the promotions store.
///
/// `code: None` marks an automatic coupon that is evaluated against every
/// cart without the customer typing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub code: Option<String>,
    pub min_cart_value: Money,
    pub eligible_skus: SkuFilter,
    pub discount: DiscountSpec,
    pub stackable: bool,
    pub active_window: ActiveWindow,
    pub is_active: bool,
}

impl Coupon {
    pub fn is_automatic(&self) -> bool {
        self.code.is_none()
    }

    /// Active flag set and `now` inside the window.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.active_window.contains(now)
    }

    /// Display label for messages: the code, or the id for automatic coupons.
    pub fn label(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.id)
    }
}

// =============================================================================
// Cart Item Status (state machine)
// =============================================================================

/// Lifecycle status of a persisted cart row.
///
/// ```text
///   IN_CART ──begin_checkout──► CHECKED_OUT ──confirm_purchase──► PURCHASED
///      ▲                             │                            (terminal)
///      └──────revert_checkout────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartItemStatus {
    /// In the customer's cart; quantity may change.
    InCart,
    /// Frozen under a provisional order id while payment is pending.
    CheckedOut,
    /// Paid. Write-once history.
    Purchased,
}

impl CartItemStatus {
    /// Only IN_CART rows are exposed to view/update-quantity operations.
    pub const fn is_mutable(&self) -> bool {
        matches!(self, CartItemStatus::InCart)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            CartItemStatus::InCart => "IN_CART",
            CartItemStatus::CheckedOut => "CHECKED_OUT",
            CartItemStatus::Purchased => "PURCHASED",
        }
    }
}

impl Default for CartItemStatus {
    fn default() -> Self {
        CartItemStatus::InCart
    }
}

impl std::fmt::Display for CartItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The permitted status transitions.
///
/// The database layer turns each transition into a single conditional bulk
/// `UPDATE ... WHERE status = from()`, so the row's current status is checked
/// and changed in one storage-level step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartTransition {
    BeginCheckout,
    ConfirmPurchase,
    RevertCheckout,
}

impl CartTransition {
    pub const fn from(&self) -> CartItemStatus {
        match self {
            CartTransition::BeginCheckout => CartItemStatus::InCart,
            CartTransition::ConfirmPurchase => CartItemStatus::CheckedOut,
            CartTransition::RevertCheckout => CartItemStatus::CheckedOut,
        }
    }

    pub const fn to(&self) -> CartItemStatus {
        match self {
            CartTransition::BeginCheckout => CartItemStatus::CheckedOut,
            CartTransition::ConfirmPurchase => CartItemStatus::Purchased,
            CartTransition::RevertCheckout => CartItemStatus::InCart,
        }
    }

    /// Applies the transition to a single in-memory status.
    pub fn apply(&self, current: CartItemStatus) -> Result<CartItemStatus, CoreError> {
        if current != self.from() {
            return Err(CoreError::InvalidTransition {
                from: current,
                to: self.to(),
            });
        }
        Ok(self.to())
    }
}

// =============================================================================
// Cart Item (persisted)
// =============================================================================

/// A persisted cart row owned by exactly one user.
///
/// `user_id` never changes after creation. Prices are frozen when the item is
/// added, so a checked-out snapshot is exactly what the customer pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub cart_key: String,
    pub user_id: String,
    pub base_sku: String,
    pub color_slug: Option<String>,
    pub size_slug: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub sale_price_cents: Option<i64>,
    pub status: CartItemStatus,
    pub order_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub removed_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Builds the variant key a user's IN_CART rows are merged on.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::CartItem;
    ///
    /// assert_eq!(CartItem::make_cart_key("TEE", Some("red"), None), "TEE|red|");
    /// ```
    pub fn make_cart_key(base_sku: &str, color_slug: Option<&str>, size_slug: Option<&str>) -> String {
        format!(
            "{}|{}|{}",
            base_sku,
            color_slug.unwrap_or_default(),
            size_slug.unwrap_or_default()
        )
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Converts the row into the ephemeral line the pricing engine consumes.
    pub fn to_cart_line(&self) -> CartLine {
        CartLine {
            sku: self.base_sku.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price(),
            sale_price: self.sale_price_cents.map(Money::from_cents),
            color: self.color_slug.clone(),
            size: self.size_slug.clone(),
        }
    }
}

// =============================================================================
// Customer Profile
// =============================================================================

/// The commerce profile behind an authenticated identity.
///
/// An authenticated user without a profile has not finished onboarding and
/// cannot hold a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub user_id: String,
    pub display_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
