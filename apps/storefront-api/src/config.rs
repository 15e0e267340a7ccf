//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! `COUPON_POLICY` has no default: the operator picks how explicit codes and
//! automatic coupons interact.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use storefront_core::pricing::CouponPolicy;

/// Storefront API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a cart write waits for another writer's lock
    pub db_busy_timeout_ms: u64,

    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// How long applied codes are remembered per user
    pub coupon_session_ttl_secs: i64,

    /// Max users tracked by the coupon session cache
    pub coupon_session_capacity: usize,

    /// Server-wide coupon policy; a quote request may override it
    pub coupon_policy: CouponPolicy,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: parse_or(&lookup, "PORT", 8080)?,

            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "./storefront.db".to_string()),

            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,

            db_busy_timeout_ms: parse_or(&lookup, "DB_BUSY_TIMEOUT_MS", 5_000)?,

            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| {
                // Development only; production MUST set JWT_SECRET
                "storefront-dev-secret-change-in-production".to_string()
            }),

            coupon_session_ttl_secs: parse_or(&lookup, "COUPON_SESSION_TTL_SECS", 1800)?, // 30 minutes

            coupon_session_capacity: parse_or(&lookup, "COUPON_SESSION_CAPACITY", 10_000)?,

            coupon_policy: lookup("COUPON_POLICY")
                .ok_or_else(|| ConfigError::MissingRequired("COUPON_POLICY".to_string()))
                .and_then(|raw| {
                    CouponPolicy::from_str(&raw)
                        .map_err(|_| ConfigError::InvalidValue("COUPON_POLICY".to_string()))
                })?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.coupon_session_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("COUPON_SESSION_TTL_SECS".to_string()));
        }

        Ok(config)
    }

    /// `host:port` for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_policy() {
        let config = ApiConfig::from_lookup(lookup(&[("COUPON_POLICY", "explicit_only")])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_busy_timeout_ms, 5_000);
        assert_eq!(config.coupon_session_ttl_secs, 1800);
        assert_eq!(config.coupon_policy, CouponPolicy::ExplicitOnly);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_policy_is_required() {
        let err = ApiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(key) if key == "COUPON_POLICY"));
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("COUPON_POLICY", "explicit_only"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "PORT"));

        let err = ApiConfig::from_lookup(lookup(&[("COUPON_POLICY", "whatever")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "COUPON_POLICY"));
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("COUPON_POLICY", "explicit_with_auto_fallback"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("COUPON_SESSION_TTL_SECS", "60"),
            ("DB_BUSY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.db_busy_timeout_ms, 250);
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.coupon_session_ttl_secs, 60);
        assert_eq!(config.coupon_policy, CouponPolicy::ExplicitWithAutoFallback);
    }
}
