//! # Pricing Orchestrator
//!
//! Composes BOGO pairing and coupon evaluation into one price breakdown.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingRequest { lines, coupon_code?, existing_codes, policy, now }    │
//! │       │                                                                 │
//! │       ▼  validate_cart_lines        (fail fast, nothing computed yet)   │
//! │       │                                                                 │
//! │       ▼  CartSnapshot::evaluate     subtotal + compute_bogo             │
//! │       │                                                                 │
//! │       ▼  CouponPolicy                                                   │
//! │       │    ExplicitOnly              code → validate_coupon             │
//! │       │    ExplicitThenAuto          code → validate, else auto-apply   │
//! │       │    ExplicitWithAutoFallback  code → validate, on failure auto   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PriceBreakdown { subtotal, bogo_discount, coupon_discount,             │
//! │                   total = max(0, subtotal - bogo - coupon) }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::bogo::{compute_bogo, BogoResult};
use crate::catalog::PromotionCatalog;
use crate::coupon::{evaluate_auto_apply, validate_coupon, AppliedCoupon, CouponContext};
use crate::error::{CoreResult, ErrorCode};
use crate::messages::LocalizedMessage;
use crate::money::Money;
use crate::types::{CartLine, SkuFilter};
use crate::validation::validate_cart_lines;

// =============================================================================
// Cart Snapshot
// =============================================================================

/// A cart with its subtotal and BOGO result computed once.
///
/// Coupon rules read the post-BOGO numbers from here, so the BOGO pass is
/// never repeated within one evaluation.
#[derive(Debug, Clone)]
pub struct CartSnapshot<'a> {
    lines: &'a [CartLine],
    subtotal: Money,
    bogo: BogoResult,
}

impl<'a> CartSnapshot<'a> {
    pub fn evaluate<C>(lines: &'a [CartLine], catalog: &C) -> Self
    where
        C: PromotionCatalog + ?Sized,
    {
        CartSnapshot {
            lines,
            subtotal: lines.iter().map(CartLine::line_total).sum(),
            bogo: compute_bogo(lines, catalog),
        }
    }

    /// Sum of every line at its effective unit price.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn bogo(&self) -> &BogoResult {
        &self.bogo
    }

    /// The subtotal coupon minimums are checked against.
    pub fn post_bogo_subtotal(&self) -> Money {
        self.subtotal.saturating_sub(self.bogo.bogo_discount_amount)
    }

    /// The part of the post-BOGO subtotal a coupon's SKU filter covers.
    ///
    /// For a SKU list, the matching lines are taken at their line totals and
    /// the discount of every BOGO pair whose two units both match is removed.
    /// Pairs straddling the filter keep their discount outside it.
    pub fn eligible_subtotal(&self, filter: &SkuFilter) -> Money {
        let post_bogo = self.post_bogo_subtotal();

        match filter {
            SkuFilter::All => post_bogo,
            SkuFilter::Skus(_) => {
                let matching: Money = self
                    .lines
                    .iter()
                    .filter(|line| filter.matches(&line.sku))
                    .map(CartLine::line_total)
                    .sum();
                let paired_discount: Money = self
                    .bogo
                    .pairs
                    .iter()
                    .filter(|pair| filter.matches(&pair.sku_a) && filter.matches(&pair.sku_b))
                    .map(|pair| pair.discount)
                    .sum();

                matching.saturating_sub(paired_discount).min(post_bogo)
            }
        }
    }

    pub fn into_bogo(self) -> BogoResult {
        self.bogo
    }
}

// =============================================================================
// Coupon Policy
// =============================================================================

/// How an explicit code and automatic coupons combine.
///
/// No `Default`: every caller names its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponPolicy {
    /// Only the supplied code is considered; no code means no coupon.
    ExplicitOnly,
    /// The supplied code if any, otherwise the best automatic coupon. A
    /// failing code is surfaced and auto-apply is not attempted.
    ExplicitThenAuto,
    /// Like `ExplicitThenAuto`, but a failing code also falls back to the
    /// best automatic coupon. The rejection is still reported.
    ExplicitWithAutoFallback,
}

impl CouponPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CouponPolicy::ExplicitOnly => "explicit_only",
            CouponPolicy::ExplicitThenAuto => "explicit_then_auto",
            CouponPolicy::ExplicitWithAutoFallback => "explicit_with_auto_fallback",
        }
    }
}

impl fmt::Display for CouponPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown coupon policy '{0}', expected explicit_only, explicit_then_auto or explicit_with_auto_fallback")]
pub struct ParsePolicyError(pub String);

impl FromStr for CouponPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit_only" => Ok(CouponPolicy::ExplicitOnly),
            "explicit_then_auto" => Ok(CouponPolicy::ExplicitThenAuto),
            "explicit_with_auto_fallback" => Ok(CouponPolicy::ExplicitWithAutoFallback),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

// =============================================================================
// Request & Breakdown
// =============================================================================

/// Input to [`price_cart`].
#[derive(Debug, Clone)]
pub struct PricingRequest<'a> {
    pub lines: &'a [CartLine],
    pub coupon_code: Option<String>,
    pub existing_codes: Vec<String>,
    pub policy: CouponPolicy,
    pub now: DateTime<Utc>,
}

/// A coupon code that was supplied but did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponRejection {
    pub code: String,
    pub error_code: ErrorCode,
    pub message: LocalizedMessage,
}

/// The consolidated price used for checkout and receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub bogo_discount: Money,
    pub coupon_discount: Money,
    /// `max(0, subtotal - bogo_discount - coupon_discount)`
    pub total: Money,
    pub bogo: BogoResult,
    pub applied_coupon: Option<AppliedCoupon>,
    pub coupon_rejection: Option<CouponRejection>,
}

/// Prices a cart: BOGO first, then coupons on the post-BOGO subtotal.
///
/// ## Errors
/// Only boundary validation of `lines` fails. Coupon rejections are part of
/// the breakdown, not errors.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use storefront_core::catalog::CatalogSnapshot;
/// use storefront_core::pricing::{price_cart, CouponPolicy, PricingRequest};
/// use storefront_core::{CartLine, Money};
///
/// let lines = [CartLine::new("MUG", 2, Money::from_cents(1_250))];
/// let breakdown = price_cart(
///     &PricingRequest {
///         lines: &lines,
///         coupon_code: None,
///         existing_codes: Vec::new(),
///         policy: CouponPolicy::ExplicitOnly,
///         now: Utc::now(),
///     },
///     &CatalogSnapshot::new(),
/// )
/// .unwrap();
///
/// assert_eq!(breakdown.total.cents(), 2_500);
/// ```
pub fn price_cart<C>(request: &PricingRequest<'_>, catalog: &C) -> CoreResult<PriceBreakdown>
where
    C: PromotionCatalog + ?Sized,
{
    validate_cart_lines(request.lines)?;

    let cart = CartSnapshot::evaluate(request.lines, catalog);
    let ctx = CouponContext::new(request.now).with_existing_codes(&request.existing_codes);

    let mut rejection = None;
    let explicit = match request.coupon_code.as_deref() {
        Some(code) => match validate_coupon(code, &cart, catalog, &ctx) {
            Ok(applied) => Some(applied),
            Err(err) => {
                rejection = Some(CouponRejection {
                    code: code.trim().to_ascii_uppercase(),
                    error_code: err.code(),
                    message: err.message(),
                });
                None
            }
        },
        None => None,
    };

    let try_auto = match request.policy {
        CouponPolicy::ExplicitOnly => false,
        CouponPolicy::ExplicitThenAuto => request.coupon_code.is_none(),
        CouponPolicy::ExplicitWithAutoFallback => explicit.is_none(),
    };

    let applied_coupon = if try_auto {
        evaluate_auto_apply(&cart, catalog, &ctx)
    } else {
        explicit
    };

    let subtotal = cart.subtotal();
    let bogo_discount = cart.bogo().bogo_discount_amount;
    let coupon_discount = applied_coupon
        .as_ref()
        .map(|c| c.discount)
        .unwrap_or_default();

    Ok(PriceBreakdown {
        subtotal,
        bogo_discount,
        coupon_discount,
        total: (subtotal - bogo_discount - coupon_discount).clamp_non_negative(),
        bogo: cart.into_bogo(),
        applied_coupon,
        coupon_rejection: rejection,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
