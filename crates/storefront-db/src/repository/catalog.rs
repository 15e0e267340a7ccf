//! # Catalog Repository
//!
//! Promotion groups, SKU → group mappings and coupons, and the per-request
//! [`CatalogSnapshot`] built from them.
//!
//! ## Snapshot Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  snapshot()                                                             │
//! │    BEGIN                    ← one read transaction, one consistent view │
//! │    SELECT promotion_groups                                              │
//! │    SELECT sku_promotion_groups                                          │
//! │    SELECT coupons                                                       │
//! │    COMMIT                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogSnapshot (owned, immutable, dropped after the request)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A coupon row that cannot be decoded is logged and left out of the
//! snapshot; pricing continues without it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use storefront_core::catalog::CatalogSnapshot;
use storefront_core::{ActiveWindow, Coupon, DiscountSpec, Money, PromotionGroup, SkuFilter};

const DISCOUNT_PERCENTAGE: &str = "percentage";
const DISCOUNT_FIXED: &str = "fixed";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    group_id: String,
    fixed_pair_price_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SkuGroupRow {
    sku: String,
    group_id: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: String,
    code: Option<String>,
    min_cart_value_cents: i64,
    eligible_skus: Option<String>,
    discount_type: String,
    discount_value: i64,
    stackable: bool,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let eligible_skus = match row.eligible_skus.as_deref() {
            None => SkuFilter::All,
            Some(json) => {
                let skus: Vec<String> = serde_json::from_str(json)
                    .map_err(|e| DbError::corrupt("Coupon", &row.id, format!("eligible_skus: {e}")))?;
                SkuFilter::skus(skus)
            }
        };

        let discount = match row.discount_type.as_str() {
            DISCOUNT_PERCENTAGE => DiscountSpec::Percentage {
                bps: u32::try_from(row.discount_value)
                    .map_err(|_| DbError::corrupt("Coupon", &row.id, "percentage out of range"))?,
            },
            DISCOUNT_FIXED => DiscountSpec::Fixed {
                amount: Money::from_cents(row.discount_value),
            },
            other => {
                return Err(DbError::corrupt(
                    "Coupon",
                    &row.id,
                    format!("unknown discount_type '{other}'"),
                ))
            }
        };

        Ok(Coupon {
            id: row.id,
            code: row.code,
            min_cart_value: Money::from_cents(row.min_cart_value_cents),
            eligible_skus,
            discount,
            stackable: row.stackable,
            active_window: ActiveWindow {
                starts_at: row.starts_at,
                ends_at: row.ends_at,
            },
            is_active: row.is_active,
        })
    }
}

fn discount_columns(spec: &DiscountSpec) -> (&'static str, i64) {
    match spec {
        DiscountSpec::Percentage { bps } => (DISCOUNT_PERCENTAGE, i64::from(*bps)),
        DiscountSpec::Fixed { amount } => (DISCOUNT_FIXED, amount.cents()),
    }
}

fn eligible_skus_column(filter: &SkuFilter) -> DbResult<Option<String>> {
    match filter {
        SkuFilter::All => Ok(None),
        SkuFilter::Skus(skus) => serde_json::to_string(skus)
            .map(Some)
            .map_err(|e| DbError::Internal(e.to_string())),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for promotion catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Loads the whole promotion catalog as one consistent snapshot.
    pub async fn snapshot(&self) -> DbResult<CatalogSnapshot> {
        let mut tx = self.pool.begin().await?;

        let groups: Vec<GroupRow> =
            sqlx::query_as("SELECT group_id, fixed_pair_price_cents FROM promotion_groups")
                .fetch_all(&mut *tx)
                .await?;

        let mappings: Vec<SkuGroupRow> = sqlx::query_as("SELECT sku, group_id FROM sku_promotion_groups")
            .fetch_all(&mut *tx)
            .await?;

        let coupons: Vec<CouponRow> = sqlx::query_as(
            r#"
            SELECT id, code, min_cart_value_cents, eligible_skus,
                   discount_type, discount_value, stackable,
                   starts_at, ends_at, is_active
            FROM coupons
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut snapshot = CatalogSnapshot::new();
        for group in groups {
            snapshot.insert_group(PromotionGroup::new(
                group.group_id,
                Money::from_cents(group.fixed_pair_price_cents),
            ));
        }
        for mapping in mappings {
            snapshot.map_sku(mapping.sku, mapping.group_id);
        }
        for row in coupons {
            let id = row.id.clone();
            match Coupon::try_from(row) {
                Ok(coupon) => snapshot.insert_coupon(coupon),
                Err(err) => warn!(coupon_id = %id, error = %err, "Skipping undecodable coupon"),
            }
        }

        debug!(
            groups = snapshot.group_count(),
            coupons = snapshot.coupon_count(),
            "Catalog snapshot loaded"
        );

        Ok(snapshot)
    }

    /// Creates or replaces a promotion group.
    pub async fn upsert_group(&self, group: &PromotionGroup) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO promotion_groups (group_id, fixed_pair_price_cents, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (group_id) DO UPDATE SET
                fixed_pair_price_cents = excluded.fixed_pair_price_cents
            "#,
        )
        .bind(&group.group_id)
        .bind(group.fixed_pair_price.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Maps a SKU to a group, replacing any earlier mapping.
    pub async fn assign_sku(&self, sku: &str, group_id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sku_promotion_groups (sku, group_id) VALUES (?1, ?2)
            ON CONFLICT (sku) DO UPDATE SET group_id = excluded.group_id
            "#,
        )
        .bind(sku)
        .bind(group_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a coupon. Codes are unique case-insensitively.
    pub async fn insert_coupon(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, code = ?coupon.code, "Inserting coupon");

        let (discount_type, discount_value) = discount_columns(&coupon.discount);
        let eligible_skus = eligible_skus_column(&coupon.eligible_skus)?;

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, min_cart_value_cents, eligible_skus,
                discount_type, discount_value, stackable,
                starts_at, ends_at, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.min_cart_value.cents())
        .bind(eligible_skus)
        .bind(discount_type)
        .bind(discount_value)
        .bind(coupon.stackable)
        .bind(coupon.active_window.starts_at)
        .bind(coupon.active_window.ends_at)
        .bind(coupon.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Turns a coupon on or off without touching its window.
    pub async fn set_coupon_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        Ok(())
    }

    pub async fn coupon_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use storefront_core::catalog::{CatalogError, PromotionCatalog};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn coupon(id: &str, code: Option<&str>) -> Coupon {
        Coupon {
            id: id.to_string(),
            code: code.map(str::to_string),
            min_cart_value: Money::from_cents(500),
            eligible_skus: SkuFilter::skus(["TEE-A", "TEE-B"]),
            discount: DiscountSpec::Percentage { bps: 1500 },
            stackable: true,
            active_window: ActiveWindow::between(ts("2026-01-01T00:00:00Z"), ts("2026-12-31T00:00:00Z")),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_snapshot_round_trips_catalog() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        catalog
            .upsert_group(&PromotionGroup::new("tees", Money::from_cents(450)))
            .await
            .unwrap();
        catalog.assign_sku("TEE-A", "tees").await.unwrap();
        catalog.insert_coupon(&coupon("c1", Some("Save15"))).await.unwrap();
        catalog.insert_coupon(&coupon("auto1", None)).await.unwrap();

        let snapshot = catalog.snapshot().await.unwrap();

        let group = snapshot.promotion_group("TEE-A").unwrap().unwrap();
        assert_eq!(group.fixed_pair_price.cents(), 450);
        assert!(snapshot.promotion_group("MUG").unwrap().is_none());

        let coded = snapshot.coupon("SAVE15").unwrap();
        assert_eq!(coded, coupon("c1", Some("Save15")));
        assert_eq!(snapshot.active_automatic_coupons(ts("2026-06-01T00:00:00Z")).len(), 1);
        assert!(snapshot.active_automatic_coupons(ts("2027-01-01T00:00:00Z")).is_empty());
    }

    #[tokio::test]
    async fn test_dangling_mapping_surfaces_as_catalog_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().assign_sku("TEE-A", "gone").await.unwrap();

        let snapshot = db.catalog().snapshot().await.unwrap();
        assert!(matches!(
            snapshot.promotion_group("TEE-A"),
            Err(CatalogError::DanglingGroup { .. })
        ));
    }

    #[tokio::test]
    async fn test_codes_unique_case_insensitively() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        catalog.insert_coupon(&coupon("c1", Some("SAVE"))).await.unwrap();
        let err = catalog.insert_coupon(&coupon("c2", Some("save"))).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_coupon_is_skipped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().insert_coupon(&coupon("good", Some("GOOD"))).await.unwrap();
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, eligible_skus, discount_type, discount_value,
                                 starts_at, created_at)
            VALUES ('bad', 'BAD', 'not json', 'fixed', 100, ?1, ?1)
            "#,
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let snapshot = db.catalog().snapshot().await.unwrap();
        assert!(snapshot.coupon("GOOD").is_some());
        assert!(snapshot.coupon("BAD").is_none());
    }

    #[tokio::test]
    async fn test_set_coupon_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().insert_coupon(&coupon("c1", Some("SAVE"))).await.unwrap();
        db.catalog().set_coupon_active("c1", false).await.unwrap();

        let snapshot = db.catalog().snapshot().await.unwrap();
        assert!(!snapshot.coupon("SAVE").unwrap().is_active);
        assert!(db.catalog().set_coupon_active("missing", true).await.unwrap_err().is_not_found());
    }
}
