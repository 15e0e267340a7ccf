//! Identity resolution.
//!
//! The API never checks credentials itself: an [`IdentityVerifier`] turns a
//! bearer token into a user id before any cart operation runs. The default
//! verifier checks HS256 JWTs signed by the identity provider.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Role carried by the payment collaborator's tokens.
pub const PAYMENTS_ROLE: &str = "payments";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Service role, absent for customers
    #[serde(default)]
    pub role: Option<String>,
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Option<String>,
}

impl Identity {
    pub fn require_role(&self, role: &str) -> Result<(), AuthError> {
        if self.role.as_deref() == Some(role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                role: role.to_string(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Role {role} required")]
    Forbidden { role: String },

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Resolves a bearer token to an identity.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HS256 JWT verifier.
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        JwtVerifier {
            secret: secret.into(),
        }
    }

    /// Issues a token; used by tests and local tooling.
    pub fn issue(
        &self,
        user_id: &str,
        role: Option<&str>,
        lifetime_secs: i64,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime_secs)).timestamp(),
            role: role.map(str::to_string),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn identity_from_parts(parts: &Parts, state: &AppState) -> Result<Option<Identity>, AuthError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or(AuthError::MissingToken)?;

    state.verifier.verify(token).map(Some)
}

// =============================================================================
// Extractors
// =============================================================================

/// A request that must carry a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts, state)?
            .map(AuthenticatedUser)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// A request that may be anonymous. A token that is present but invalid is
/// still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(identity_from_parts(parts, state)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let verifier = JwtVerifier::new("test-secret");

        let token = verifier.issue("user-1", None, 3600).unwrap();
        let identity = verifier.verify(&token).unwrap();

        assert_eq!(identity.user_id, "user-1");
        assert!(identity.role.is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtVerifier::new("one").issue("user-1", None, 3600).unwrap();
        let err = JwtVerifier::new("two").verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new("test-secret");
        let token = verifier.issue("user-1", None, -3600).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_role_check() {
        let verifier = JwtVerifier::new("test-secret");
        let token = verifier.issue("psp", Some(PAYMENTS_ROLE), 3600).unwrap();
        let identity = verifier.verify(&token).unwrap();

        assert!(identity.require_role(PAYMENTS_ROLE).is_ok());
        assert!(matches!(
            identity.require_role("admin"),
            Err(AuthError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
