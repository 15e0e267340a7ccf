//! # Promotion Catalog
//!
//! Read-only view of promotion groups and coupons used by one evaluation.
//!
//! ## Snapshot Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request arrives                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogRepository::snapshot()   ← ONE read from the promotions store   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogSnapshot (immutable)                                            │
//! │       │                                                                 │
//! │       ├──► compute_bogo()          promotion_group(sku)                 │
//! │       ├──► validate_coupon()       coupon(code)                         │
//! │       └──► evaluate_auto_apply()   active_automatic_coupons(now)        │
//! │                                                                         │
//! │  Dropped at the end of the request. Never shared between requests.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{Coupon, PromotionGroup};

/// A catalog lookup that could not be answered.
///
/// Pricing never fails because of this: the affected SKU is priced as
/// ungrouped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The SKU references a group that the snapshot does not contain.
    #[error("SKU {sku} references unknown promotion group {group_id}")]
    DanglingGroup { sku: String, group_id: String },

    #[error("Catalog lookup failed: {0}")]
    Unavailable(String),
}

/// Lookups the pricing engine needs from the catalog.
///
/// Implementations must answer from a fixed snapshot: two calls with the same
/// argument during one evaluation return the same answer.
pub trait PromotionCatalog {
    /// The promotion group a SKU belongs to, if any.
    fn promotion_group(&self, sku: &str) -> Result<Option<PromotionGroup>, CatalogError>;

    /// Exact, case-insensitive code lookup. Returns the coupon regardless of
    /// its active flag or window; the evaluator decides liveness.
    fn coupon(&self, code: &str) -> Option<Coupon>;

    /// Automatic (code-less) coupons that are active at `now`.
    fn active_automatic_coupons(&self, now: DateTime<Utc>) -> Vec<Coupon>;
}

// =============================================================================
// In-memory Snapshot
// =============================================================================

/// In-memory catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    groups: HashMap<String, PromotionGroup>,
    sku_groups: HashMap<String, String>,
    coupons_by_code: HashMap<String, Coupon>,
    automatic: Vec<Coupon>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group definition.
    pub fn insert_group(&mut self, group: PromotionGroup) {
        self.groups.insert(group.group_id.clone(), group);
    }

    /// Maps a SKU to a group id. A SKU belongs to at most one group, so a
    /// later mapping replaces an earlier one.
    pub fn map_sku(&mut self, sku: impl Into<String>, group_id: impl Into<String>) {
        self.sku_groups.insert(sku.into(), group_id.into());
    }

    /// Convenience: registers the group and maps the SKU to it.
    pub fn assign_group(&mut self, sku: impl Into<String>, group: PromotionGroup) {
        self.map_sku(sku, group.group_id.clone());
        self.insert_group(group);
    }

    /// Adds a coupon. Coded coupons are indexed by upper-cased code.
    pub fn insert_coupon(&mut self, coupon: Coupon) {
        match &coupon.code {
            Some(code) => {
                self.coupons_by_code.insert(code.to_ascii_uppercase(), coupon);
            }
            None => self.automatic.push(coupon),
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn coupon_count(&self) -> usize {
        self.coupons_by_code.len() + self.automatic.len()
    }
}

impl PromotionCatalog for CatalogSnapshot {
    fn promotion_group(&self, sku: &str) -> Result<Option<PromotionGroup>, CatalogError> {
        let Some(group_id) = self.sku_groups.get(sku) else {
            return Ok(None);
        };

        self.groups
            .get(group_id)
            .cloned()
            .map(Some)
            .ok_or_else(|| CatalogError::DanglingGroup {
                sku: sku.to_string(),
                group_id: group_id.clone(),
            })
    }

    fn coupon(&self, code: &str) -> Option<Coupon> {
        self.coupons_by_code.get(&code.to_ascii_uppercase()).cloned()
    }

    fn active_automatic_coupons(&self, now: DateTime<Utc>) -> Vec<Coupon> {
        self.automatic
            .iter()
            .filter(|c| c.is_live_at(now))
            .cloned()
            .collect()
    }
}
