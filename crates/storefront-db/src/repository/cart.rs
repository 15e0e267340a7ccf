//! # Cart Repository
//!
//! Persisted cart rows and the status transitions that settle them.
//!
//! ## Cart Item Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Item Lifecycle                               │
//! │                                                                         │
//! │  1. ADD                                                                │
//! │     └── add_item() → IN_CART row (merged by variant key)               │
//! │     └── update_quantity() / remove_item()   (0 ⇒ removed_at set)       │
//! │                                                                         │
//! │  2. BEGIN CHECKOUT                                                     │
//! │     └── begin_checkout(user, order) → every live IN_CART row becomes   │
//! │         CHECKED_OUT + order_id, in ONE conditional UPDATE              │
//! │                                                                         │
//! │  3. CONFIRM (payment collaborator, may retry)                          │
//! │     └── confirm_purchase(order) → CHECKED_OUT → PURCHASED              │
//! │         second call updates 0 rows: idempotent                         │
//! │                                                                         │
//! │  4. (OPTIONAL) REVERT                                                  │
//! │     └── revert_checkout(user, order) → CHECKED_OUT → IN_CART           │
//! │         refused once the order is PURCHASED                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! No transition reads rows first and writes them after. Each one is a single
//! `UPDATE ... WHERE status = <from>` and the affected row count is returned.
//! Two concurrent `begin_checkout` calls for one user therefore split as
//! "N rows" and "0 rows"; neither can overwrite the other.
//!
//! PURCHASED rows are additionally guarded by triggers in the schema, so even
//! a query outside this repository cannot change them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use storefront_core::{CartItem, CartItemStatus, CartTransition, Money, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

const CART_ITEM_COLUMNS: &str = r#"
    id, cart_key, user_id, base_sku, color_slug, size_slug, quantity,
    unit_price_cents, sale_price_cents, status, order_id, removed_at,
    created_at, updated_at
"#;

/// Input for [`CartRepository::add_item`].
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub base_sku: String,
    pub color_slug: Option<String>,
    pub size_slug: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub sale_price: Option<Money>,
}

impl NewCartItem {
    pub fn cart_key(&self) -> String {
        CartItem::make_cart_key(
            &self.base_sku,
            self.color_slug.as_deref(),
            self.size_slug.as_deref(),
        )
    }
}

/// Repository for persisted cart rows.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a cart item by ID, whatever its status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CartItem>> {
        let item = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// The user's live cart: IN_CART rows that were not removed.
    ///
    /// This is the only set exposed to view-cart and quantity changes, and
    /// the set `begin_checkout` freezes.
    pub async fn list_in_cart(&self, user_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            r#"
            SELECT {CART_ITEM_COLUMNS}
            FROM cart_items
            WHERE user_id = ?1 AND status = ?2 AND removed_at IS NULL
            ORDER BY created_at, id
            "#
        ))
        .bind(user_id)
        .bind(CartItemStatus::InCart)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Rows a user checked out or purchased under `order_id`.
    pub async fn items_for_order(&self, user_id: &str, order_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            r#"
            SELECT {CART_ITEM_COLUMNS}
            FROM cart_items
            WHERE user_id = ?1 AND order_id = ?2
            ORDER BY created_at, id
            "#
        ))
        .bind(user_id)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // IN_CART mutations
    // =========================================================================

    /// Adds an item to the user's cart.
    ///
    /// ## What This Does
    /// - A live IN_CART row with the same variant key gets its quantity
    ///   increased; its frozen prices stay as they were
    /// - Otherwise a new IN_CART row is inserted
    ///
    /// Runs under the write lock, so concurrent adds of one variant queue up
    /// and merge instead of failing.
    ///
    /// ## Errors
    /// - `LimitExceeded` when the merged quantity passes MAX_ITEM_QUANTITY or
    ///   the cart already has MAX_CART_ITEMS lines
    /// - `ForeignKeyViolation` when the user has no customer profile
    pub async fn add_item(&self, user_id: &str, item: &NewCartItem) -> DbResult<CartItem> {
        let cart_key = item.cart_key();
        let now = Utc::now();

        debug!(user_id = %user_id, cart_key = %cart_key, quantity = item.quantity, "Adding cart item");

        let mut tx = begin_write(&self.pool).await?;

        let existing: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT id, quantity FROM cart_items
            WHERE user_id = ?1 AND cart_key = ?2 AND status = ?3 AND removed_at IS NULL
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(&cart_key)
        .bind(CartItemStatus::InCart)
        .fetch_optional(&mut *tx)
        .await?;

        let id = match existing {
            Some((id, quantity)) => {
                let merged = quantity + item.quantity;
                if merged > MAX_ITEM_QUANTITY {
                    return Err(DbError::LimitExceeded(format!(
                        "quantity for {cart_key} would be {merged}, max is {MAX_ITEM_QUANTITY}"
                    )));
                }

                sqlx::query(
                    r#"
                    UPDATE cart_items SET quantity = ?2, updated_at = ?3
                    WHERE id = ?1 AND status = ?4 AND removed_at IS NULL
                    "#,
                )
                .bind(&id)
                .bind(merged)
                .bind(now)
                .bind(CartItemStatus::InCart)
                .execute(&mut *tx)
                .await?;

                id
            }
            None => {
                let lines: i64 = sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*) FROM cart_items
                    WHERE user_id = ?1 AND status = ?2 AND removed_at IS NULL
                    "#,
                )
                .bind(user_id)
                .bind(CartItemStatus::InCart)
                .fetch_one(&mut *tx)
                .await?;

                if lines >= MAX_CART_ITEMS as i64 {
                    return Err(DbError::LimitExceeded(format!(
                        "cart cannot have more than {MAX_CART_ITEMS} items"
                    )));
                }

                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    r#"
                    INSERT INTO cart_items (
                        id, cart_key, user_id, base_sku, color_slug, size_slug,
                        quantity, unit_price_cents, sale_price_cents, status,
                        order_id, removed_at, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, NULL, ?11, ?11)
                    "#,
                )
                .bind(&id)
                .bind(&cart_key)
                .bind(user_id)
                .bind(&item.base_sku)
                .bind(&item.color_slug)
                .bind(&item.size_slug)
                .bind(item.quantity)
                .bind(item.unit_price.cents())
                .bind(item.sale_price.map(|p| p.cents()))
                .bind(CartItemStatus::InCart)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                id
            }
        };

        let stored = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = ?1"
        ))
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    /// Sets the quantity of one of the user's live IN_CART rows.
    ///
    /// Quantity 0 removes the row (see [`remove_item`](Self::remove_item)).
    ///
    /// ## Errors
    /// `NotFound` if the row is missing, belongs to someone else, was removed
    /// or has left IN_CART.
    pub async fn update_quantity(&self, user_id: &str, id: &str, quantity: i64) -> DbResult<CartItem> {
        if quantity == 0 {
            return self.remove_item(user_id, id).await;
        }

        let result = sqlx::query(
            r#"
            UPDATE cart_items SET quantity = ?3, updated_at = ?4
            WHERE id = ?1 AND user_id = ?2 AND status = ?5 AND removed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .bind(Utc::now())
        .bind(CartItemStatus::InCart)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart item (in cart)", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart item", id))
    }

    /// Soft-removes one of the user's live IN_CART rows by stamping
    /// `removed_at`. The row is kept for history.
    pub async fn remove_item(&self, user_id: &str, id: &str) -> DbResult<CartItem> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE cart_items SET removed_at = ?3, updated_at = ?3
            WHERE id = ?1 AND user_id = ?2 AND status = ?4 AND removed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .bind(CartItemStatus::InCart)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart item (in cart)", id));
        }

        debug!(user_id = %user_id, id = %id, "Cart item removed");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart item", id))
    }

    // =========================================================================
    // Status transitions
    // =========================================================================

    /// Freezes the user's live cart under a provisional order id.
    ///
    /// ## Returns
    /// The number of rows moved to CHECKED_OUT. 0 means there was nothing to
    /// check out, including when a concurrent call already took the rows.
    ///
    /// ## Order id ownership
    /// An order id already used by another user, or already purchased, matches
    /// nothing and the call returns 0.
    pub async fn begin_checkout(&self, user_id: &str, order_id: &str) -> DbResult<u64> {
        let transition = CartTransition::BeginCheckout;

        let result = sqlx::query(
            r#"
            UPDATE cart_items
            SET status = ?3, order_id = ?2, updated_at = ?5
            WHERE user_id = ?1
              AND status = ?4
              AND removed_at IS NULL
              AND quantity > 0
              AND NOT EXISTS (
                  SELECT 1 FROM cart_items other
                  WHERE other.order_id = ?2
                    AND (other.user_id <> ?1 OR other.status = ?6)
              )
            "#,
        )
        .bind(user_id)
        .bind(order_id)
        .bind(transition.to())
        .bind(transition.from())
        .bind(Utc::now())
        .bind(CartItemStatus::Purchased)
        .execute(&self.pool)
        .await?;

        let count = result.rows_affected();
        info!(user_id = %user_id, order_id = %order_id, count, "Checkout started");

        Ok(count)
    }

    /// Marks every CHECKED_OUT row of an order as PURCHASED.
    ///
    /// Prices and quantities are not touched: the checked-out snapshot is the
    /// paid order. Re-delivery of the same confirmation updates 0 rows.
    pub async fn confirm_purchase(&self, order_id: &str) -> DbResult<u64> {
        let transition = CartTransition::ConfirmPurchase;

        let result = sqlx::query(
            r#"
            UPDATE cart_items SET status = ?2, updated_at = ?4
            WHERE order_id = ?1 AND status = ?3
            "#,
        )
        .bind(order_id)
        .bind(transition.to())
        .bind(transition.from())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let count = result.rows_affected();
        info!(order_id = %order_id, count, "Purchase confirmed");

        Ok(count)
    }

    /// Returns an abandoned checkout to the user's cart, clearing its order id.
    ///
    /// ## Errors
    /// `Transition` if the order has already been purchased. An order with no
    /// rows for this user returns 0.
    pub async fn revert_checkout(&self, user_id: &str, order_id: &str) -> DbResult<u64> {
        let transition = CartTransition::RevertCheckout;

        let result = sqlx::query(
            r#"
            UPDATE cart_items SET status = ?3, order_id = NULL, updated_at = ?5
            WHERE user_id = ?1 AND order_id = ?2 AND status = ?4
            "#,
        )
        .bind(user_id)
        .bind(order_id)
        .bind(transition.to())
        .bind(transition.from())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let count = result.rows_affected();
        if count == 0 {
            let purchased: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM cart_items WHERE user_id = ?1 AND order_id = ?2 AND status = ?3",
            )
            .bind(user_id)
            .bind(order_id)
            .bind(CartItemStatus::Purchased)
            .fetch_one(&self.pool)
            .await?;

            if purchased > 0 {
                transition.apply(CartItemStatus::Purchased)?;
            }
        }

        info!(user_id = %user_id, order_id = %order_id, count, "Checkout reverted");

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
    use storefront_core::CoreError;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.profiles().upsert("user-1", "Dana").await.unwrap();
        db.profiles().upsert("user-2", "Noa").await.unwrap();
        db
    }

    fn tee(qty: i64) -> NewCartItem {
        NewCartItem {
            base_sku: "TEE".to_string(),
            color_slug: Some("red".to_string()),
            size_slug: Some("m".to_string()),
            quantity: qty,
            unit_price: Money::from_cents(300),
            sale_price: Some(Money::from_cents(250)),
        }
    }

    fn mug() -> NewCartItem {
        NewCartItem {
            base_sku: "MUG".to_string(),
            color_slug: None,
            size_slug: None,
            quantity: 1,
            unit_price: Money::from_cents(90),
            sale_price: None,
        }
    }

    #[tokio::test]
    async fn test_add_item_merges_same_variant() {
        let db = setup().await;
        let carts = db.cart_items();

        let first = carts.add_item("user-1", &tee(1)).await.unwrap();
        let merged = carts.add_item("user-1", &tee(2)).await.unwrap();

        assert_eq!(first.id, merged.id);
        assert_eq!(merged.quantity, 3);
        assert_eq!(merged.cart_key, "TEE|red|m");
        assert_eq!(merged.status, CartItemStatus::InCart);
        assert_eq!(merged.sale_price_cents, Some(250));
        assert_eq!(carts.list_in_cart("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_item_enforces_quantity_limit() {
        let db = setup().await;
        let carts = db.cart_items();

        carts.add_item("user-1", &tee(998)).await.unwrap();
        let err = carts.add_item("user-1", &tee(2)).await.unwrap_err();
        assert!(matches!(err, DbError::LimitExceeded(_)));
    }

    #[tokio::test]
    async fn test_add_item_requires_profile() {
        let db = setup().await;
        let err = db.cart_items().add_item("stranger", &mug()).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let db = setup().await;
        let carts = db.cart_items();

        let item = carts.add_item("user-1", &mug()).await.unwrap();
        assert!(carts.list_in_cart("user-2").await.unwrap().is_empty());
        assert!(carts.update_quantity("user-2", &item.id, 5).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_quantity_zero_soft_removes() {
        let db = setup().await;
        let carts = db.cart_items();

        let item = carts.add_item("user-1", &mug()).await.unwrap();
        let updated = carts.update_quantity("user-1", &item.id, 4).await.unwrap();
        assert_eq!(updated.quantity, 4);

        let removed = carts.update_quantity("user-1", &item.id, 0).await.unwrap();
        assert!(removed.removed_at.is_some());
        assert!(carts.list_in_cart("user-1").await.unwrap().is_empty());

        // Re-adding after removal starts a fresh row
        let again = carts.add_item("user-1", &mug()).await.unwrap();
        assert_ne!(again.id, item.id);
        assert_eq!(again.quantity, 1);
    }

    #[tokio::test]
    async fn test_begin_checkout_moves_live_rows() {
        let db = setup().await;
        let carts = db.cart_items();

        carts.add_item("user-1", &tee(2)).await.unwrap();
        let removed = carts.add_item("user-1", &mug()).await.unwrap();
        carts.remove_item("user-1", &removed.id).await.unwrap();
        carts.add_item("user-2", &mug()).await.unwrap();

        assert_eq!(carts.begin_checkout("user-1", "ord_1").await.unwrap(), 1);
        assert!(carts.list_in_cart("user-1").await.unwrap().is_empty());
        assert_eq!(carts.list_in_cart("user-2").await.unwrap().len(), 1);

        let frozen = carts.items_for_order("user-1", "ord_1").await.unwrap();
        assert_eq!(frozen.len(), 1);
        assert_eq!(frozen[0].status, CartItemStatus::CheckedOut);
        assert_eq!(frozen[0].order_id.as_deref(), Some("ord_1"));
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_reports_zero() {
        let db = setup().await;
        assert_eq!(db.cart_items().begin_checkout("user-1", "ord_1").await.unwrap(), 0);
    }

    /// A real database file with a multi-connection pool, removed on drop.
    struct FileDb {
        db: Database,
        path: std::path::PathBuf,
    }

    impl FileDb {
        async fn open() -> Self {
            let path = std::env::temp_dir().join(format!("storefront-cart-{}.db", Uuid::new_v4()));
            let db = Database::new(DbConfig::new(&path).max_connections(5)).await.unwrap();
            db.profiles().upsert("user-1", "Dana").await.unwrap();
            FileDb { db, path }
        }
    }

    impl Drop for FileDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkout_has_one_winner() {
        let file = FileDb::open().await;
        let carts = file.db.cart_items();
        carts.add_item("user-1", &tee(1)).await.unwrap();
        carts.add_item("user-1", &mug()).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let carts = carts.clone();
                tokio::spawn(async move { carts.begin_checkout("user-1", &format!("ord_{i}")).await })
            })
            .collect();

        let mut counts = Vec::new();
        for task in tasks {
            counts.push(task.await.unwrap().unwrap());
        }

        assert_eq!(counts.iter().filter(|c| **c > 0).count(), 1);
        assert_eq!(counts.iter().sum::<u64>(), 2);

        let winner = counts.iter().position(|c| *c > 0).unwrap();
        let frozen = carts.items_for_order("user-1", &format!("ord_{winner}")).await.unwrap();
        assert_eq!(frozen.len(), 2);
        assert!(carts.list_in_cart("user-1").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_merge_into_one_row() {
        let file = FileDb::open().await;
        let carts = file.db.cart_items();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let carts = carts.clone();
                tokio::spawn(async move { carts.add_item("user-1", &tee(1)).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = carts.list_in_cart("user-1").await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 8);
    }

    #[tokio::test]
    async fn test_order_id_of_another_user_is_not_reused() {
        let db = setup().await;
        let carts = db.cart_items();
        carts.add_item("user-1", &mug()).await.unwrap();
        carts.add_item("user-2", &mug()).await.unwrap();

        assert_eq!(carts.begin_checkout("user-1", "ord_shared").await.unwrap(), 1);
        assert_eq!(carts.begin_checkout("user-2", "ord_shared").await.unwrap(), 0);
        assert_eq!(carts.list_in_cart("user-2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_purchase_is_idempotent() {
        let db = setup().await;
        let carts = db.cart_items();
        carts.add_item("user-1", &tee(2)).await.unwrap();
        carts.add_item("user-1", &mug()).await.unwrap();
        carts.begin_checkout("user-1", "ord_1").await.unwrap();

        assert_eq!(carts.confirm_purchase("ord_1").await.unwrap(), 2);
        let after_first = carts.items_for_order("user-1", "ord_1").await.unwrap();

        assert_eq!(carts.confirm_purchase("ord_1").await.unwrap(), 0);
        let after_second = carts.items_for_order("user-1", "ord_1").await.unwrap();

        assert_eq!(after_first, after_second);
        assert!(after_second.iter().all(|i| i.status == CartItemStatus::Purchased));
        assert_eq!(after_second.iter().map(|i| i.quantity).sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn test_revert_returns_rows_to_cart() {
        let db = setup().await;
        let carts = db.cart_items();
        carts.add_item("user-1", &tee(1)).await.unwrap();
        carts.begin_checkout("user-1", "ord_1").await.unwrap();

        assert_eq!(carts.revert_checkout("user-1", "ord_1").await.unwrap(), 1);

        let cart = carts.list_in_cart("user-1").await.unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart[0].order_id.is_none());
        assert_eq!(carts.revert_checkout("user-1", "ord_1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purchased_order_cannot_be_reverted() {
        let db = setup().await;
        let carts = db.cart_items();
        carts.add_item("user-1", &tee(1)).await.unwrap();
        carts.begin_checkout("user-1", "ord_1").await.unwrap();
        carts.confirm_purchase("ord_1").await.unwrap();

        let err = carts.revert_checkout("user-1", "ord_1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Transition(CoreError::InvalidTransition {
                from: CartItemStatus::Purchased,
                ..
            })
        ));
        // A purchased order id cannot be checked out into again
        carts.add_item("user-1", &mug()).await.unwrap();
        assert_eq!(carts.begin_checkout("user-1", "ord_1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_storage_refuses_to_touch_purchased_rows() {
        let db = setup().await;
        let carts = db.cart_items();
        let item = carts.add_item("user-1", &mug()).await.unwrap();
        carts.begin_checkout("user-1", "ord_1").await.unwrap();
        carts.confirm_purchase("ord_1").await.unwrap();

        let update = sqlx::query("UPDATE cart_items SET quantity = 50 WHERE id = ?1")
            .bind(&item.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(update, DbError::Immutable(_)));

        let delete = sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(&item.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(delete, DbError::Immutable(_)));

        let stored = carts.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
        assert_eq!(stored.status, CartItemStatus::Purchased);
    }
}
