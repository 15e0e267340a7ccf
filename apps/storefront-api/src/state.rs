//! Shared application state.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use storefront_core::cache::{CacheError, TtlCache};
use storefront_core::pricing::CouponPolicy;
use storefront_db::Database;

use crate::auth::IdentityVerifier;
use crate::config::ApiConfig;

/// Codes a user successfully applied recently, keyed by user id.
///
/// Remembered codes count as already applied for every *other* code, so a
/// conflicting code is caught even when the client forgets to send what it
/// applied. A remembered code never blocks itself: pricing it again gives the
/// same discount. Only a code the client sends twice is a double application.
pub struct CouponSessions {
    cache: Mutex<TtlCache<String, Vec<String>>>,
}

/// The codes one request is priced with once the session is folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCodes {
    /// The requested code, else the user's most recently applied one.
    pub coupon_code: Option<String>,
    /// Client-sent codes plus every remembered code except `coupon_code`.
    pub existing: Vec<String>,
}

impl CouponSessions {
    pub fn new(ttl_secs: i64, capacity: usize) -> Result<Self, CacheError> {
        Ok(CouponSessions {
            cache: Mutex::new(TtlCache::new(Duration::seconds(ttl_secs), capacity)?),
        })
    }

    async fn remembered(&self, user_id: Option<&str>) -> Vec<String> {
        let Some(user_id) = user_id else {
            return Vec::new();
        };
        let cache = self.cache.lock().await;
        cache
            .get(&user_id.to_string(), Utc::now())
            .cloned()
            .unwrap_or_default()
    }

    /// Request codes plus remembered codes, upper-cased, without duplicates.
    pub async fn merged_codes(&self, user_id: Option<&str>, requested: Vec<String>) -> Vec<String> {
        let remembered = self.remembered(user_id).await;
        normalize(requested.into_iter().chain(remembered))
    }

    /// Resolves the code to price and the codes it must stack with.
    ///
    /// Client-sent duplicates of `coupon_code` are kept, so an explicit
    /// double application is still NOT_STACKABLE.
    pub async fn resolve(
        &self,
        user_id: Option<&str>,
        coupon_code: Option<String>,
        requested: Vec<String>,
    ) -> SessionCodes {
        let remembered = normalize(self.remembered(user_id).await);

        let coupon_code = coupon_code
            .map(|c| c.trim().to_ascii_uppercase())
            .or_else(|| remembered.last().cloned());

        let others = remembered
            .into_iter()
            .filter(|c| Some(c) != coupon_code.as_ref());
        let mut existing = normalize(others);
        for code in requested {
            existing.push(code.trim().to_ascii_uppercase());
        }

        SessionCodes {
            coupon_code,
            existing,
        }
    }

    /// Remembers a successfully applied code as the user's latest.
    pub async fn record(&self, user_id: &str, code: &str) {
        let now = Utc::now();
        let mut cache = self.cache.lock().await;

        let mut codes = cache.get(&user_id.to_string(), now).cloned().unwrap_or_default();
        let code = code.trim().to_ascii_uppercase();
        codes.retain(|c| *c != code);
        codes.push(code);
        cache.insert(user_id.to_string(), codes, now);
    }

    /// Forgets the user's codes, e.g. after checkout.
    pub async fn clear(&self, user_id: &str) {
        self.cache.lock().await.remove(&user_id.to_string());
    }
}

fn normalize<I>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut merged: Vec<String> = Vec::new();
    for code in codes {
        let code = code.trim().to_ascii_uppercase();
        if !merged.contains(&code) {
            merged.push(code);
        }
    }
    merged
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub db: Database,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub coupon_sessions: CouponSessions,
    pub policy: CouponPolicy,
}

impl AppState {
    pub fn new(
        db: Database,
        verifier: Arc<dyn IdentityVerifier>,
        config: &ApiConfig,
    ) -> Result<Self, CacheError> {
        Ok(AppState {
            db,
            verifier,
            coupon_sessions: CouponSessions::new(
                config.coupon_session_ttl_secs,
                config.coupon_session_capacity,
            )?,
            policy: config.coupon_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_merge_and_clear() {
        let sessions = CouponSessions::new(60, 10).unwrap();

        sessions.record("user-1", "save10").await;
        sessions.record("user-1", "SAVE10").await;

        let merged = sessions
            .merged_codes(Some("user-1"), vec!["vip".to_string(), "Save10".to_string()])
            .await;
        assert_eq!(merged, vec!["VIP".to_string(), "SAVE10".to_string()]);

        // Other users and anonymous callers see only what they sent
        assert!(sessions.merged_codes(Some("user-2"), Vec::new()).await.is_empty());
        assert!(sessions.merged_codes(None, Vec::new()).await.is_empty());

        sessions.clear("user-1").await;
        assert!(sessions.merged_codes(Some("user-1"), Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_remembered_code_does_not_block_itself() {
        let sessions = CouponSessions::new(60, 10).unwrap();
        sessions.record("user-1", "SAVE10").await;

        let codes = sessions
            .resolve(Some("user-1"), Some("save10".to_string()), Vec::new())
            .await;
        assert_eq!(codes.coupon_code.as_deref(), Some("SAVE10"));
        assert!(codes.existing.is_empty());

        // A different code must stack with the remembered one
        let codes = sessions
            .resolve(Some("user-1"), Some("SOLO".to_string()), Vec::new())
            .await;
        assert_eq!(codes.existing, vec!["SAVE10".to_string()]);
    }

    #[tokio::test]
    async fn test_client_duplicate_is_kept() {
        let sessions = CouponSessions::new(60, 10).unwrap();
        sessions.record("user-1", "SAVE10").await;

        let codes = sessions
            .resolve(Some("user-1"), Some("SAVE10".to_string()), vec!["save10".to_string()])
            .await;
        assert_eq!(codes.existing, vec!["SAVE10".to_string()]);
    }

    #[tokio::test]
    async fn test_latest_remembered_code_is_priced_by_default() {
        let sessions = CouponSessions::new(60, 10).unwrap();
        sessions.record("user-1", "SAVE10").await;
        sessions.record("user-1", "VIP").await;

        let codes = sessions.resolve(Some("user-1"), None, Vec::new()).await;
        assert_eq!(codes.coupon_code.as_deref(), Some("VIP"));
        assert_eq!(codes.existing, vec!["SAVE10".to_string()]);

        // Re-applying makes a code the latest again
        sessions.record("user-1", "save10").await;
        let codes = sessions.resolve(Some("user-1"), None, Vec::new()).await;
        assert_eq!(codes.coupon_code.as_deref(), Some("SAVE10"));

        let anonymous = sessions.resolve(None, None, Vec::new()).await;
        assert_eq!(anonymous.coupon_code, None);
        assert!(anonymous.existing.is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(CouponSessions::new(60, 0).is_err());
    }
}
