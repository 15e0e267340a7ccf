//! Coupon endpoints.
//!
//! Both evaluate against one catalog snapshot and the post-BOGO cart. A
//! signed-in caller's recently applied codes count as already applied, except
//! when the code being applied is one of them: re-applying is idempotent.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use storefront_core::coupon::{evaluate_auto_apply, validate_coupon, AppliedCoupon, CouponContext};
use storefront_core::pricing::CartSnapshot;
use storefront_core::LocalizedMessage;

use crate::auth::MaybeUser;
use crate::error::ApiError;
use crate::requests::{ApplyCouponRequest, AutoApplyRequest, ValidJson};
use crate::state::AppState;

pub const NO_AUTO_COUPON_AVAILABLE: &str = "NO_AUTO_COUPON_AVAILABLE";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponAppliedResponse {
    pub success: bool,
    #[serde(flatten)]
    pub coupon: AppliedCoupon,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AutoApplyResponse {
    Applied(CouponAppliedResponse),
    Unavailable {
        success: bool,
        code: &'static str,
        message: LocalizedMessage,
    },
}

/// POST /coupon/apply: validate a customer-entered code.
#[tracing::instrument(skip_all, fields(code = %req.code))]
pub async fn apply(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ValidJson(req): ValidJson<ApplyCouponRequest>,
) -> Result<Json<CouponAppliedResponse>, ApiError> {
    let (code, existing) = req.validate()?;
    let user_id = identity.as_ref().map(|i| i.user_id.as_str());

    let codes = state
        .coupon_sessions
        .resolve(user_id, Some(code.clone()), existing)
        .await;
    let catalog = state.db.catalog().snapshot().await?;
    let cart = CartSnapshot::evaluate(&req.cart_items, &catalog);
    let ctx = CouponContext::new(Utc::now()).with_existing_codes(&codes.existing);

    let coupon = validate_coupon(&code, &cart, &catalog, &ctx).map_err(|err| {
        tracing::info!(error_code = %err.code(), "coupon rejected");
        err
    })?;

    if let Some(user_id) = user_id {
        state.coupon_sessions.record(user_id, &code).await;
    }

    tracing::info!(discount = coupon.discount.cents(), "coupon applied");

    Ok(Json(CouponAppliedResponse {
        success: true,
        coupon,
    }))
}

/// POST /coupon/auto-apply: the best automatic coupon, if any.
#[tracing::instrument(skip_all, fields(lines = req.cart_items.len()))]
pub async fn auto_apply(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ValidJson(req): ValidJson<AutoApplyRequest>,
) -> Result<Json<AutoApplyResponse>, ApiError> {
    let existing = req.validate()?;
    let user_id = identity.as_ref().map(|i| i.user_id.as_str());

    let existing = state.coupon_sessions.merged_codes(user_id, existing).await;
    let catalog = state.db.catalog().snapshot().await?;
    let cart = CartSnapshot::evaluate(&req.cart_items, &catalog);
    let ctx = CouponContext::new(Utc::now()).with_existing_codes(&existing);

    let response = match evaluate_auto_apply(&cart, &catalog, &ctx) {
        Some(coupon) => {
            tracing::info!(coupon_id = %coupon.coupon_id, discount = coupon.discount.cents(), "auto coupon selected");
            AutoApplyResponse::Applied(CouponAppliedResponse {
                success: true,
                coupon,
            })
        }
        None => AutoApplyResponse::Unavailable {
            success: false,
            code: NO_AUTO_COUPON_AVAILABLE,
            message: LocalizedMessage::no_auto_coupon(),
        },
    };

    Ok(Json(response))
}
