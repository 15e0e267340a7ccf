//! # Schema Migrations
//!
//! The schema is embedded from `migrations/sqlite/` and applied when the
//! database opens. After applying, the guards that keep settled orders
//! frozen are checked to be present.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  run_migrations(pool)                                                   │
//! │       │                                                                 │
//! │       ├── versions already in _sqlx_migrations                          │
//! │       ├── MIGRATOR.run            pending files, in filename order      │
//! │       ├── log each newly applied version                                │
//! │       └── verify_cart_guards      every PURCHASED guard trigger exists  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Existing files are never edited; a change is a new `NNN_description.sql`.
//! A migration that must rewrite PURCHASED rows drops and recreates the guard
//! triggers around the change.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Triggers that keep cart rows consistent once written.
pub const CART_GUARD_TRIGGERS: [&str; 3] = [
    "trg_cart_items_user_immutable",
    "trg_cart_items_purchased_no_update",
    "trg_cart_items_purchased_no_delete",
];

/// Applies pending migrations and returns how many ran.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<usize> {
    let before = applied_versions(pool).await?;

    MIGRATOR.run(pool).await?;

    let mut newly_applied = 0;
    for migration in MIGRATOR.iter().filter(|m| !before.contains(&m.version)) {
        info!(version = migration.version, description = %migration.description, "Applied migration");
        newly_applied += 1;
    }

    verify_cart_guards(pool).await?;

    Ok(newly_applied)
}

/// Versions recorded as successfully applied; empty on a fresh database.
async fn applied_versions(pool: &SqlitePool) -> DbResult<Vec<i64>> {
    let tracked: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    if tracked.is_none() {
        return Ok(Vec::new());
    }

    let versions = sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
        .fetch_all(pool)
        .await?;
    Ok(versions)
}

/// Fails when any of [`CART_GUARD_TRIGGERS`] is missing.
pub async fn verify_cart_guards(pool: &SqlitePool) -> DbResult<()> {
    let installed: Vec<String> = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'trigger'")
        .fetch_all(pool)
        .await?;

    let missing: Vec<&str> = CART_GUARD_TRIGGERS
        .iter()
        .copied()
        .filter(|name| !installed.iter().any(|t| t == name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        warn!(?missing, "cart guard triggers missing");
        Err(DbError::MigrationFailed(format!(
            "cart guard triggers missing: {}",
            missing.join(", ")
        )))
    }
}
