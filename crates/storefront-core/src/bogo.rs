//! # BOGO Pairing Engine
//!
//! Groups cart units by promotion group and pairs them for a fixed price.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines: [TEE-A ×1 @300] [TEE-B ×2 @250] [MUG ×1 @90]                    │
//! │       │                                                                 │
//! │       ▼  1. expand to units at effective price                          │
//! │  TEE-A 300 │ TEE-B 250 │ TEE-B 250 │ MUG 90                             │
//! │       │                                                                 │
//! │       ▼  2. partition by group (MUG has none → dropped)                 │
//! │  tees: [TEE-A 300, TEE-B 250, TEE-B 250]                                │
//! │       │                                                                 │
//! │       ▼  3. sort by price desc, ties keep input order                   │
//! │       │                                                                 │
//! │       ▼  4. pair neighbours: (TEE-A, TEE-B) + leftover TEE-B            │
//! │       │                                                                 │
//! │       ▼  5. discount = max(0, 550 - 450) = 100                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pairing the most expensive units first is the customer-benefit policy. For
//! the same input order and group assignment the pairs are always identical,
//! so the server and the client receipt agree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::catalog::PromotionCatalog;
use crate::money::Money;
use crate::types::{BogoPair, CartLine, PromotionGroup};

/// Output of [`compute_bogo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BogoResult {
    pub bogo_discount_amount: Money,
    /// Sum of the original prices of every paired unit.
    pub regular_total_eligible: Money,
    /// `regular_total_eligible - bogo_discount_amount`
    pub discounted_total_eligible: Money,
    pub has_leftover: bool,
    pub pairs: Vec<BogoPair>,
    /// One entry per group with an odd unit count.
    pub leftovers: Vec<BogoLeftover>,
}

/// The unpaired trailing unit of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BogoLeftover {
    pub group_id: String,
    pub sku: String,
    pub unit_price: Money,
}

#[derive(Debug)]
struct Unit<'a> {
    sku: &'a str,
    price: Money,
}

#[derive(Debug)]
struct GroupBucket<'a> {
    group: PromotionGroup,
    units: Vec<Unit<'a>>,
}

/// Resolves a SKU's group, degrading lookup failures to "ungrouped".
fn resolve_group<C>(catalog: &C, sku: &str) -> Option<PromotionGroup>
where
    C: PromotionCatalog + ?Sized,
{
    match catalog.promotion_group(sku) {
        Ok(group) => group,
        Err(err) => {
            warn!(sku = %sku, error = %err, "Promotion group unresolvable, pricing SKU as ungrouped");
            None
        }
    }
}

/// Computes BOGO pairs and the resulting discount for a set of cart lines.
///
/// ## Edge Cases
/// - No line belongs to a group → all-zero result, `has_leftover = false`
/// - A group with one unit → that unit is leftover, nothing is paired
/// - Quantity 0 lines contribute no units
///
/// ## Example
/// ```rust
/// use storefront_core::bogo::compute_bogo;
/// use storefront_core::catalog::CatalogSnapshot;
/// use storefront_core::{CartLine, Money, PromotionGroup};
///
/// let mut catalog = CatalogSnapshot::new();
/// catalog.assign_group("TEE", PromotionGroup::new("tees", Money::from_cents(450)));
///
/// let result = compute_bogo(&[CartLine::new("TEE", 3, Money::from_cents(300))], &catalog);
/// assert_eq!(result.pairs.len(), 1);
/// assert_eq!(result.bogo_discount_amount.cents(), 150);
/// assert!(result.has_leftover);
/// ```
pub fn compute_bogo<C>(lines: &[CartLine], catalog: &C) -> BogoResult
where
    C: PromotionCatalog + ?Sized,
{
    // Group membership is looked up once per SKU for this computation only
    let mut membership: HashMap<&str, Option<PromotionGroup>> = HashMap::new();
    let mut buckets: Vec<GroupBucket<'_>> = Vec::new();
    let mut bucket_index: HashMap<String, usize> = HashMap::new();

    for line in lines {
        if line.quantity <= 0 {
            continue;
        }

        let group = membership
            .entry(line.sku.as_str())
            .or_insert_with(|| resolve_group(catalog, &line.sku))
            .clone();
        let Some(group) = group else {
            continue;
        };

        let idx = *bucket_index
            .entry(group.group_id.clone())
            .or_insert_with(|| {
                buckets.push(GroupBucket {
                    group,
                    units: Vec::new(),
                });
                buckets.len() - 1
            });

        let price = line.effective_unit_price();
        let bucket = &mut buckets[idx];
        for _ in 0..line.quantity {
            bucket.units.push(Unit {
                sku: &line.sku,
                price,
            });
        }
    }

    let mut result = BogoResult::default();

    for bucket in &mut buckets {
        // Stable sort: equal prices keep their input order
        bucket.units.sort_by(|a, b| b.price.cmp(&a.price));

        let pair_price = bucket.group.fixed_pair_price;
        let mut chunks = bucket.units.chunks_exact(2);
        for chunk in &mut chunks {
            let (a, b) = (&chunk[0], &chunk[1]);
            let original_sum = a.price + b.price;
            let discount = original_sum.saturating_sub(pair_price);

            result.bogo_discount_amount += discount;
            result.regular_total_eligible += original_sum;
            result.discounted_total_eligible += original_sum - discount;
            result.pairs.push(BogoPair {
                group_id: bucket.group.group_id.clone(),
                sku_a: a.sku.to_string(),
                sku_b: b.sku.to_string(),
                original_sum,
                pair_price,
                discount,
            });
        }

        if let [leftover] = chunks.remainder() {
            result.has_leftover = true;
            result.leftovers.push(BogoLeftover {
                group_id: bucket.group.group_id.clone(),
                sku: leftover.sku.to_string(),
                unit_price: leftover.price,
            });
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, CatalogSnapshot};
    use chrono::{DateTime, Utc};
    use crate::types::Coupon;

    fn tees_catalog(pair_price: i64) -> CatalogSnapshot {
        let mut catalog = CatalogSnapshot::new();
        let tees = PromotionGroup::new("tees", Money::from_cents(pair_price));
        catalog.assign_group("TEE-A", tees.clone());
        catalog.assign_group("TEE-B", tees.clone());
        catalog.assign_group("TEE-C", tees);
        catalog
    }

    fn line(sku: &str, qty: i64, price: i64) -> CartLine {
        CartLine::new(sku, qty, Money::from_cents(price))
    }

    #[test]
    fn test_single_pair_discount() {
        let catalog = tees_catalog(450);
        let result = compute_bogo(&[line("TEE-A", 1, 300), line("TEE-B", 1, 250)], &catalog);

        assert_eq!(result.bogo_discount_amount.cents(), 100);
        assert_eq!(result.regular_total_eligible.cents(), 550);
        assert_eq!(result.discounted_total_eligible.cents(), 450);
        assert!(!result.has_leftover);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].sku_a, "TEE-A");
        assert_eq!(result.pairs[0].sku_b, "TEE-B");
    }

    #[test]
    fn test_pairs_most_expensive_first() {
        let catalog = tees_catalog(400);
        let lines = [line("TEE-C", 1, 100), line("TEE-A", 1, 300), line("TEE-B", 1, 250), line("TEE-B", 1, 150)];
        let result = compute_bogo(&lines, &catalog);

        // Sorted: 300, 250, 150, 100 → (300+250) and (150+100)
        assert_eq!(result.pairs.len(), 2);
        assert_eq!(result.pairs[0].original_sum.cents(), 550);
        assert_eq!(result.pairs[0].discount.cents(), 150);
        assert_eq!(result.pairs[1].original_sum.cents(), 250);
        assert_eq!(result.pairs[1].discount.cents(), 0);
        assert_eq!(result.bogo_discount_amount.cents(), 150);
    }

    #[test]
    fn test_discount_never_negative() {
        let catalog = tees_catalog(1000);
        let result = compute_bogo(&[line("TEE-A", 2, 100)], &catalog);

        assert_eq!(result.pairs.len(), 1);
        assert!(result.bogo_discount_amount.is_zero());
        assert_eq!(result.discounted_total_eligible, result.regular_total_eligible);
    }

    #[test]
    fn test_odd_count_leaves_one_unit() {
        let catalog = tees_catalog(450);
        let result = compute_bogo(&[line("TEE-A", 3, 300), line("TEE-B", 2, 250)], &catalog);

        assert_eq!(result.pairs.len(), 2);
        assert!(result.has_leftover);
        assert_eq!(result.leftovers.len(), 1);
        // 300,300,300,250,250 → the last 250 is left over
        assert_eq!(result.leftovers[0].sku, "TEE-B");
        assert_eq!(result.leftovers[0].unit_price.cents(), 250);
    }

    #[test]
    fn test_single_unit_is_leftover_not_paired() {
        let catalog = tees_catalog(450);
        let result = compute_bogo(&[line("TEE-A", 1, 300)], &catalog);

        assert!(result.pairs.is_empty());
        assert!(result.has_leftover);
        assert!(result.bogo_discount_amount.is_zero());
        assert!(result.regular_total_eligible.is_zero());
    }

    #[test]
    fn test_ungrouped_cart_is_all_zero() {
        let catalog = tees_catalog(450);
        let result = compute_bogo(&[line("MUG", 4, 90)], &catalog);

        assert_eq!(result, BogoResult::default());
        assert!(!result.has_leftover);
    }

    #[test]
    fn test_zero_quantity_contributes_nothing() {
        let catalog = tees_catalog(450);
        let result = compute_bogo(&[line("TEE-A", 0, 300), line("TEE-B", 1, 250)], &catalog);

        assert!(result.pairs.is_empty());
        assert!(result.has_leftover);
    }

    #[test]
    fn test_groups_never_mix() {
        let mut catalog = tees_catalog(450);
        catalog.assign_group("CAP", PromotionGroup::new("caps", Money::from_cents(100)));

        let result = compute_bogo(&[line("TEE-A", 1, 300), line("CAP", 1, 200)], &catalog);

        assert!(result.pairs.is_empty());
        assert_eq!(result.leftovers.len(), 2);
    }

    #[test]
    fn test_sale_price_used_when_lower() {
        let catalog = tees_catalog(400);
        let lines = [
            line("TEE-A", 1, 300).with_sale_price(Money::from_cents(200)),
            line("TEE-B", 1, 300),
        ];
        let result = compute_bogo(&lines, &catalog);

        assert_eq!(result.regular_total_eligible.cents(), 500);
        assert_eq!(result.bogo_discount_amount.cents(), 100);
        // The 300 unit sorts first
        assert_eq!(result.pairs[0].sku_a, "TEE-B");
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let catalog = tees_catalog(450);
        let lines = [line("TEE-B", 2, 250), line("TEE-A", 2, 250), line("TEE-C", 1, 250)];

        let first = compute_bogo(&lines, &catalog);
        let second = compute_bogo(&lines, &catalog);
        assert_eq!(first, second);
        // Equal prices keep input order
        assert_eq!(first.pairs[0].sku_a, "TEE-B");
        assert_eq!(first.pairs[0].sku_b, "TEE-B");
        assert_eq!(first.pairs[1].sku_a, "TEE-A");
    }

    #[test]
    fn test_discounted_total_identity_holds() {
        let catalog = tees_catalog(333);
        for qty in 0..7 {
            let result = compute_bogo(&[line("TEE-A", qty, 199), line("TEE-B", qty, 301)], &catalog);
            assert!(!result.bogo_discount_amount.is_negative());
            assert_eq!(
                result.discounted_total_eligible,
                result.regular_total_eligible - result.bogo_discount_amount
            );
        }
    }

    struct FailingCatalog;

    impl PromotionCatalog for FailingCatalog {
        fn promotion_group(&self, sku: &str) -> Result<Option<PromotionGroup>, CatalogError> {
            if sku == "BROKEN" {
                Err(CatalogError::Unavailable("group table missing".to_string()))
            } else {
                Ok(Some(PromotionGroup::new("g", Money::from_cents(100))))
            }
        }

        fn coupon(&self, _code: &str) -> Option<Coupon> {
            None
        }

        fn active_automatic_coupons(&self, _now: DateTime<Utc>) -> Vec<Coupon> {
            Vec::new()
        }
    }

    #[test]
    fn test_unresolvable_group_degrades_to_ungrouped() {
        let result = compute_bogo(&[line("BROKEN", 2, 500), line("OK", 2, 100)], &FailingCatalog);

        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].sku_a, "OK");
        assert_eq!(result.bogo_discount_amount.cents(), 100);
    }
}
