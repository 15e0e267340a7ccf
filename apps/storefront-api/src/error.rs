//! API error types with HTTP response mapping.
//!
//! ```text
//! INVALID_REQUEST                       400
//! UNAUTHENTICATED                       401  (403 when the identity lacks a role)
//! PROFILE_NOT_FOUND / NOT_FOUND         404
//! NOT_FOUND / BELOW_MINIMUM /
//!   NOT_STACKABLE / NO_ELIGIBLE_ITEMS   422  coupon rule failures
//! UNKNOWN_ERROR                         500  detail logged, never returned
//! ```
//!
//! Every error body has the same shape:
//! `{ "success": false, "errorCode": "...", "message": { "en": "...", "he": "..." } }`

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use storefront_core::coupon::CouponError;
use storefront_core::{CoreError, ErrorCode, LocalizedMessage, ValidationError};
use storefront_db::DbError;

use crate::auth::AuthError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or unvalidated input.
    BadRequest(String),
    /// No valid identity on a request that needs one.
    Unauthenticated,
    /// Valid identity without the role the endpoint requires.
    Forbidden,
    /// Authenticated user with no customer profile.
    ProfileNotFound,
    /// Resource not found.
    NotFound(String),
    /// A coupon rule rejected the code.
    Coupon(CouponError),
    /// Internal server error.
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error_code: ErrorCode,
    message: LocalizedMessage,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidRequest,
                LocalizedMessage::invalid_request(&detail),
            ),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthenticated,
                LocalizedMessage::unauthenticated(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorCode::Unauthenticated,
                LocalizedMessage::unauthenticated(),
            ),
            ApiError::ProfileNotFound => (
                StatusCode::NOT_FOUND,
                ErrorCode::ProfileNotFound,
                LocalizedMessage::profile_not_found(),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                LocalizedMessage::not_found(&what),
            ),
            ApiError::Coupon(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.code(), err.message()),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::UnknownError,
                    LocalizedMessage::unknown_error(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error_code,
            message,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err.code() {
            ErrorCode::InvalidRequest => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CouponError> for ApiError {
    fn from(err: CouponError) -> Self {
        ApiError::Coupon(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden { .. } => ApiError::Forbidden,
            AuthError::Signing(msg) => ApiError::Internal(msg),
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                tracing::debug!(error = %err, "rejected credentials");
                ApiError::Unauthenticated
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(entity),
            DbError::LimitExceeded(msg) => ApiError::BadRequest(msg),
            DbError::Transition(core) => ApiError::from(core),
            // cart_items.user_id references customer_profiles
            DbError::ForeignKeyViolation { .. } => ApiError::ProfileNotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
