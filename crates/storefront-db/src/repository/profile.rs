//! # Profile Repository
//!
//! Customer profiles behind authenticated identities. A user without a
//! profile has not finished onboarding and cannot hold a cart.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::CustomerProfile;

/// Repository for customer profile operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Gets the profile for a user id.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<CustomerProfile>> {
        let profile = sqlx::query_as::<_, CustomerProfile>(
            r#"
            SELECT user_id, display_name, created_at
            FROM customer_profiles
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn exists(&self, user_id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customer_profiles WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Creates a profile, or updates the display name if one exists.
    pub async fn upsert(&self, user_id: &str, display_name: &str) -> DbResult<CustomerProfile> {
        debug!(user_id = %user_id, "Upserting customer profile");

        sqlx::query(
            r#"
            INSERT INTO customer_profiles (user_id, display_name, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id) DO UPDATE SET display_name = excluded.display_name
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let profile = sqlx::query_as::<_, CustomerProfile>(
            "SELECT user_id, display_name, created_at FROM customer_profiles WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }
}
