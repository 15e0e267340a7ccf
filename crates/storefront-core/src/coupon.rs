//! # Coupon Rule Evaluator
//!
//! Validates an explicit coupon code against a cart, and picks the best
//! automatic coupon when the customer typed none.
//!
//! ## Validation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_coupon(code, cart, catalog, ctx)                              │
//! │                                                                         │
//! │  1. coupon(code) absent / inactive / outside window  → NOT_FOUND        │
//! │  2. post-BOGO subtotal < min_cart_value               → BELOW_MINIMUM   │
//! │  3. code already applied                              → NOT_STACKABLE   │
//! │     existing codes and coupon not stackable           → NOT_STACKABLE   │
//! │     an existing code is itself not stackable          → NOT_STACKABLE   │
//! │  4. no cart line matches the SKU filter               → NO_ELIGIBLE_ITEMS│
//! │  5. discount from DiscountSpec on the eligible subtotal → success       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Discount Rules
//! - Percentage: basis points of the eligible subtotal, rounded half-up once
//! - Fixed: the amount, capped at the eligible subtotal
//!
//! The eligible subtotal never exceeds the post-BOGO cart subtotal, so no
//! coupon can push a total below zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::catalog::PromotionCatalog;
use crate::error::ErrorCode;
use crate::messages::LocalizedMessage;
use crate::money::Money;
use crate::pricing::CartSnapshot;
use crate::types::{Coupon, DiscountSpec};

// =============================================================================
// Errors
// =============================================================================

/// Why a coupon was not applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponError {
    /// Unknown code, inactive coupon, or `now` outside its active window.
    #[error("Coupon {code} not found")]
    NotFound { code: String },

    #[error("Coupon {code} requires a subtotal of {minimum}, cart has {subtotal}")]
    BelowMinimum {
        code: String,
        minimum: Money,
        subtotal: Money,
    },

    #[error("Coupon {code} cannot be stacked with the applied coupons")]
    NotStackable { code: String },

    #[error("Coupon {code} matches no item in the cart")]
    NoEligibleItems { code: String },
}

impl CouponError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CouponError::NotFound { .. } => ErrorCode::NotFound,
            CouponError::BelowMinimum { .. } => ErrorCode::BelowMinimum,
            CouponError::NotStackable { .. } => ErrorCode::NotStackable,
            CouponError::NoEligibleItems { .. } => ErrorCode::NoEligibleItems,
        }
    }

    /// The bilingual message shown to the customer.
    pub fn message(&self) -> LocalizedMessage {
        match self {
            CouponError::NotFound { code } => LocalizedMessage::coupon_not_found(code),
            CouponError::BelowMinimum { code, minimum, .. } => {
                LocalizedMessage::below_minimum(code, *minimum)
            }
            CouponError::NotStackable { code } => LocalizedMessage::not_stackable(code),
            CouponError::NoEligibleItems { code } => LocalizedMessage::no_eligible_items(code),
        }
    }
}

// =============================================================================
// Context & Result
// =============================================================================

/// Everything besides the cart and catalog that a coupon decision depends on.
#[derive(Debug, Clone)]
pub struct CouponContext {
    /// Evaluation time, passed in so results are reproducible.
    pub now: DateTime<Utc>,
    /// Codes already applied to this cart, normalized to upper case.
    pub existing_codes: Vec<String>,
}

impl CouponContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        CouponContext {
            now,
            existing_codes: Vec::new(),
        }
    }

    pub fn with_existing_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.existing_codes = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_ascii_uppercase())
            .collect();
        self
    }
}

/// A coupon that passed every rule, with the discount it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub coupon_id: String,
    /// `None` for automatic coupons.
    pub code: Option<String>,
    pub automatic: bool,
    pub eligible_subtotal: Money,
    pub discount: Money,
    pub message: LocalizedMessage,
}

// =============================================================================
// Discount Computation
// =============================================================================

/// Applies a discount spec to an eligible subtotal. Never negative, never
/// above the eligible subtotal.
///
/// ## Example
/// ```rust
/// use storefront_core::coupon::compute_discount;
/// use storefront_core::{DiscountSpec, Money};
///
/// let eligible = Money::from_cents(45_000);
/// assert_eq!(compute_discount(&DiscountSpec::Percentage { bps: 1000 }, eligible).cents(), 4_500);
/// assert_eq!(
///     compute_discount(&DiscountSpec::Fixed { amount: Money::from_cents(99_999) }, eligible),
///     eligible
/// );
/// ```
pub fn compute_discount(spec: &DiscountSpec, eligible: Money) -> Money {
    let eligible = eligible.clamp_non_negative();
    let discount = match spec {
        DiscountSpec::Percentage { bps } => eligible.percentage_of(*bps),
        DiscountSpec::Fixed { amount } => amount.clamp_non_negative(),
    };
    discount.min(eligible)
}

/// Stacking rule shared by explicit and automatic coupons.
fn stacking_allows<C>(coupon: &Coupon, catalog: &C, ctx: &CouponContext) -> bool
where
    C: PromotionCatalog + ?Sized,
{
    if ctx.existing_codes.is_empty() {
        return true;
    }

    if let Some(code) = &coupon.code {
        let code = code.to_ascii_uppercase();
        if ctx.existing_codes.iter().any(|existing| *existing == code) {
            return false;
        }
    }

    if !coupon.stackable {
        return false;
    }

    // Codes the catalog no longer knows cannot block anything
    ctx.existing_codes
        .iter()
        .filter_map(|existing| catalog.coupon(existing))
        .all(|existing| existing.stackable)
}

// =============================================================================
// Explicit Code
// =============================================================================

/// Validates a customer-entered code and computes its discount.
///
/// ## Arguments
/// * `code` - The code as entered; compared case-insensitively
/// * `cart` - Cart snapshot with BOGO already applied
/// * `catalog` - The snapshot taken for this request
/// * `ctx` - Evaluation time and already-applied codes
pub fn validate_coupon<C>(
    code: &str,
    cart: &CartSnapshot<'_>,
    catalog: &C,
    ctx: &CouponContext,
) -> Result<AppliedCoupon, CouponError>
where
    C: PromotionCatalog + ?Sized,
{
    let code = code.trim().to_ascii_uppercase();

    let coupon = catalog
        .coupon(&code)
        .filter(|c| !c.is_automatic() && c.is_live_at(ctx.now))
        .ok_or_else(|| CouponError::NotFound { code: code.clone() })?;

    let subtotal = cart.post_bogo_subtotal();
    if subtotal < coupon.min_cart_value {
        return Err(CouponError::BelowMinimum {
            code,
            minimum: coupon.min_cart_value,
            subtotal,
        });
    }

    if !stacking_allows(&coupon, catalog, ctx) {
        return Err(CouponError::NotStackable { code });
    }

    let eligible = cart.eligible_subtotal(&coupon.eligible_skus);
    if !eligible.is_positive() {
        return Err(CouponError::NoEligibleItems { code });
    }

    let discount = compute_discount(&coupon.discount, eligible);

    Ok(AppliedCoupon {
        coupon_id: coupon.id.clone(),
        message: LocalizedMessage::coupon_applied(&code, discount),
        code: Some(code),
        automatic: false,
        eligible_subtotal: eligible,
        discount,
    })
}

// =============================================================================
// Automatic Coupons
// =============================================================================

/// Picks the automatic coupon granting the largest discount.
///
/// Candidates must be live, meet their minimum, match at least one line and
/// be compatible with the already-applied codes. Ties go to the coupon whose
/// window started most recently.
///
/// ## Returns
/// `None` when nothing qualifies. That is a normal outcome.
pub fn evaluate_auto_apply<C>(
    cart: &CartSnapshot<'_>,
    catalog: &C,
    ctx: &CouponContext,
) -> Option<AppliedCoupon>
where
    C: PromotionCatalog + ?Sized,
{
    let subtotal = cart.post_bogo_subtotal();

    let best = catalog
        .active_automatic_coupons(ctx.now)
        .into_iter()
        .filter(|c| c.is_automatic() && c.is_live_at(ctx.now))
        .filter(|c| subtotal >= c.min_cart_value)
        .filter(|c| stacking_allows(c, catalog, ctx))
        .filter_map(|c| {
            let eligible = cart.eligible_subtotal(&c.eligible_skus);
            if !eligible.is_positive() {
                return None;
            }
            let discount = compute_discount(&c.discount, eligible);
            discount.is_positive().then_some((c, eligible, discount))
        })
        .max_by(|(a, _, da), (b, _, db)| {
            da.cmp(db)
                .then(a.active_window.starts_at.cmp(&b.active_window.starts_at))
                .then(b.id.cmp(&a.id))
        })?;

    let (coupon, eligible, discount) = best;
    Some(AppliedCoupon {
        message: LocalizedMessage::auto_coupon_applied(coupon.label(), discount),
        coupon_id: coupon.id,
        code: None,
        automatic: true,
        eligible_subtotal: eligible,
        discount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use crate::types::{ActiveWindow, CartLine, PromotionGroup, SkuFilter};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-06-01T12:00:00Z".parse().unwrap()
    }

    fn coupon(id: &str, code: Option<&str>, discount: DiscountSpec) -> Coupon {
        Coupon {
            id: id.to_string(),
            code: code.map(str::to_string),
            min_cart_value: Money::zero(),
            eligible_skus: SkuFilter::All,
            discount,
            stackable: false,
            active_window: ActiveWindow::open_from(now() - Duration::days(7)),
            is_active: true,
        }
    }

    fn pct(bps: u32) -> DiscountSpec {
        DiscountSpec::Percentage { bps }
    }

    fn fixed(cents: i64) -> DiscountSpec {
        DiscountSpec::Fixed {
            amount: Money::from_cents(cents),
        }
    }

    fn line(sku: &str, qty: i64, price: i64) -> CartLine {
        CartLine::new(sku, qty, Money::from_cents(price))
    }

    fn tees_catalog() -> CatalogSnapshot {
        let mut catalog = CatalogSnapshot::new();
        let tees = PromotionGroup::new("tees", Money::from_cents(450));
        catalog.assign_group("TEE-A", tees.clone());
        catalog.assign_group("TEE-B", tees);
        catalog
    }

    // -------------------------------------------------------------------------
    // validate_coupon
    // -------------------------------------------------------------------------

    #[test]
    fn test_percentage_coupon_applies() {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_coupon(coupon("c1", Some("SAVE10"), pct(1000)));
        let lines = [line("MUG", 3, 15_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let applied = validate_coupon("save10", &cart, &catalog, &CouponContext::new(now())).unwrap();
        assert_eq!(applied.discount.cents(), 4_500);
        assert_eq!(applied.code.as_deref(), Some("SAVE10"));
        assert_eq!(applied.message.en, "Coupon SAVE10 applied: you saved ₪45.00");
        assert!(!applied.automatic);
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let catalog = CatalogSnapshot::new();
        let lines = [line("MUG", 1, 100)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let err = validate_coupon("NOPE", &cart, &catalog, &CouponContext::new(now())).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.message().he.contains("NOPE"));
    }

    #[test]
    fn test_expired_and_inactive_are_not_found() {
        let mut catalog = CatalogSnapshot::new();
        let mut expired = coupon("c1", Some("OLD"), pct(1000));
        expired.active_window = ActiveWindow::between(now() - Duration::days(10), now());
        let mut inactive = coupon("c2", Some("OFF"), pct(1000));
        inactive.is_active = false;
        let mut future = coupon("c3", Some("SOON"), pct(1000));
        future.active_window = ActiveWindow::open_from(now() + Duration::hours(1));
        catalog.insert_coupon(expired);
        catalog.insert_coupon(inactive);
        catalog.insert_coupon(future);

        let lines = [line("MUG", 1, 10_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);
        let ctx = CouponContext::new(now());

        for code in ["OLD", "OFF", "SOON"] {
            assert!(matches!(
                validate_coupon(code, &cart, &catalog, &ctx),
                Err(CouponError::NotFound { .. })
            ));
        }
    }

    #[test]
    fn test_minimum_checked_against_post_bogo_subtotal() {
        let mut catalog = tees_catalog();
        let mut c = coupon("c1", Some("MIN500"), fixed(50));
        c.min_cart_value = Money::from_cents(500);
        catalog.insert_coupon(c);

        // Raw subtotal 550, post-BOGO 450
        let lines = [line("TEE-A", 1, 300), line("TEE-B", 1, 250)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let err = validate_coupon("MIN500", &cart, &catalog, &CouponContext::new(now())).unwrap_err();
        assert_eq!(
            err,
            CouponError::BelowMinimum {
                code: "MIN500".to_string(),
                minimum: Money::from_cents(500),
                subtotal: Money::from_cents(450),
            }
        );
    }

    #[test]
    fn test_non_stackable_with_existing_codes() {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_coupon(coupon("c1", Some("SOLO"), pct(1000)));
        let lines = [line("MUG", 1, 10_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);
        let ctx = CouponContext::new(now()).with_existing_codes(["OTHER"]);

        let err = validate_coupon("SOLO", &cart, &catalog, &ctx).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotStackable);
    }

    #[test]
    fn test_existing_non_stackable_code_blocks_stackable_coupon() {
        let mut catalog = CatalogSnapshot::new();
        let mut stackable = coupon("c1", Some("STACK"), pct(500));
        stackable.stackable = true;
        catalog.insert_coupon(stackable);
        catalog.insert_coupon(coupon("c2", Some("SOLO"), pct(1000)));

        let lines = [line("MUG", 1, 10_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let blocked = CouponContext::new(now()).with_existing_codes(["solo"]);
        assert!(matches!(
            validate_coupon("STACK", &cart, &catalog, &blocked),
            Err(CouponError::NotStackable { .. })
        ));

        // Stacks on top of an unknown (retired) code
        let retired = CouponContext::new(now()).with_existing_codes(["RETIRED"]);
        assert!(validate_coupon("STACK", &cart, &catalog, &retired).is_ok());
    }

    #[test]
    fn test_same_code_twice_is_rejected() {
        let mut catalog = CatalogSnapshot::new();
        let mut c = coupon("c1", Some("STACK"), pct(500));
        c.stackable = true;
        catalog.insert_coupon(c);

        let lines = [line("MUG", 1, 10_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);
        let ctx = CouponContext::new(now()).with_existing_codes(["STACK"]);

        assert!(matches!(
            validate_coupon("stack", &cart, &catalog, &ctx),
            Err(CouponError::NotStackable { .. })
        ));
    }

    #[test]
    fn test_minimum_checked_before_stacking() {
        let mut catalog = CatalogSnapshot::new();
        let mut c = coupon("c1", Some("BIG"), pct(1000));
        c.min_cart_value = Money::from_cents(1_000_000);
        catalog.insert_coupon(c);

        let lines = [line("MUG", 1, 100)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);
        let ctx = CouponContext::new(now()).with_existing_codes(["OTHER"]);

        assert_eq!(
            validate_coupon("BIG", &cart, &catalog, &ctx).unwrap_err().code(),
            ErrorCode::BelowMinimum
        );
    }

    #[test]
    fn test_sku_filter_restricts_discount() {
        let mut catalog = CatalogSnapshot::new();
        let mut c = coupon("c1", Some("MUGS"), pct(5000));
        c.eligible_skus = SkuFilter::skus(["MUG"]);
        catalog.insert_coupon(c);

        let lines = [line("MUG", 2, 1_000), line("HAT", 1, 9_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let applied = validate_coupon("MUGS", &cart, &catalog, &CouponContext::new(now())).unwrap();
        assert_eq!(applied.eligible_subtotal.cents(), 2_000);
        assert_eq!(applied.discount.cents(), 1_000);
    }

    #[test]
    fn test_no_matching_lines() {
        let mut catalog = CatalogSnapshot::new();
        let mut c = coupon("c1", Some("MUGS"), pct(5000));
        c.eligible_skus = SkuFilter::skus(["MUG"]);
        catalog.insert_coupon(c);

        let lines = [line("HAT", 1, 9_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let err = validate_coupon("MUGS", &cart, &catalog, &CouponContext::new(now())).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoEligibleItems);
    }

    #[test]
    fn test_fixed_discount_capped_at_eligible_subtotal() {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_coupon(coupon("c1", Some("HUGE"), fixed(1_000_000)));

        let lines = [line("MUG", 1, 1_500)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let applied = validate_coupon("HUGE", &cart, &catalog, &CouponContext::new(now())).unwrap();
        assert_eq!(applied.discount.cents(), 1_500);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(compute_discount(&pct(1500), Money::from_cents(333)).cents(), 50);
        assert_eq!(compute_discount(&pct(1000), Money::from_cents(5)).cents(), 1);
        assert_eq!(compute_discount(&pct(1000), Money::from_cents(4)).cents(), 0);
    }

    // -------------------------------------------------------------------------
    // evaluate_auto_apply
    // -------------------------------------------------------------------------

    #[test]
    fn test_auto_apply_picks_largest_discount() {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_coupon(coupon("auto-30", None, fixed(30)));
        catalog.insert_coupon(coupon("auto-45", None, fixed(45)));

        let lines = [line("MUG", 1, 1_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let applied = evaluate_auto_apply(&cart, &catalog, &CouponContext::new(now())).unwrap();
        assert_eq!(applied.coupon_id, "auto-45");
        assert_eq!(applied.discount.cents(), 45);
        assert!(applied.automatic);
        assert!(applied.code.is_none());
    }

    #[test]
    fn test_auto_apply_returns_none_when_nothing_qualifies() {
        let mut catalog = CatalogSnapshot::new();
        let mut c = coupon("auto-big", None, fixed(500));
        c.min_cart_value = Money::from_cents(100_000);
        catalog.insert_coupon(c);
        catalog.insert_coupon(coupon("coded", Some("CODE"), fixed(500)));

        let lines = [line("MUG", 1, 1_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        assert!(evaluate_auto_apply(&cart, &catalog, &CouponContext::new(now())).is_none());
    }

    #[test]
    fn test_auto_apply_tie_goes_to_most_recent() {
        let mut catalog = CatalogSnapshot::new();
        let mut older = coupon("older", None, fixed(100));
        older.active_window = ActiveWindow::open_from(now() - Duration::days(30));
        let mut newer = coupon("newer", None, fixed(100));
        newer.active_window = ActiveWindow::open_from(now() - Duration::days(1));
        catalog.insert_coupon(newer);
        catalog.insert_coupon(older);

        let lines = [line("MUG", 1, 1_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let applied = evaluate_auto_apply(&cart, &catalog, &CouponContext::new(now())).unwrap();
        assert_eq!(applied.coupon_id, "newer");
    }

    #[test]
    fn test_auto_apply_respects_stacking() {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_coupon(coupon("auto-solo", None, fixed(300)));
        let mut stackable = coupon("auto-stack", None, fixed(100));
        stackable.stackable = true;
        catalog.insert_coupon(stackable);
        let mut applied_code = coupon("c1", Some("STACK"), fixed(10));
        applied_code.stackable = true;
        catalog.insert_coupon(applied_code);

        let lines = [line("MUG", 1, 1_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);
        let ctx = CouponContext::new(now()).with_existing_codes(["STACK"]);

        let applied = evaluate_auto_apply(&cart, &catalog, &ctx).unwrap();
        assert_eq!(applied.coupon_id, "auto-stack");
    }

    #[test]
    fn test_auto_apply_uses_eligible_lines_only() {
        let mut catalog = tees_catalog();
        let mut tees_only = coupon("auto-tees", None, pct(5000));
        tees_only.eligible_skus = SkuFilter::skus(["TEE-A", "TEE-B"]);
        catalog.insert_coupon(tees_only);
        catalog.insert_coupon(coupon("auto-all", None, pct(1000)));

        // Tees pair: 550 → 450 after BOGO. Hat: 2000.
        let lines = [line("TEE-A", 1, 300), line("TEE-B", 1, 250), line("HAT", 1, 2_000)];
        let cart = CartSnapshot::evaluate(&lines, &catalog);

        let applied = evaluate_auto_apply(&cart, &catalog, &CouponContext::new(now())).unwrap();
        // 10% of 2450 = 245 beats 50% of the post-BOGO tees (450) = 225
        assert_eq!(applied.coupon_id, "auto-all");
        assert_eq!(applied.discount.cents(), 245);
    }
}
