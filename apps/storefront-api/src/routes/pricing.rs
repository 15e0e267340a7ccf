//! Full price quote: BOGO, then coupons, in one breakdown.
//!
//! Without a `couponCode`, a signed-in caller's most recently applied code is
//! priced, so a discount the customer accepted stays on the quote.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use storefront_core::pricing::{price_cart, PriceBreakdown, PricingRequest};

use crate::auth::MaybeUser;
use crate::error::ApiError;
use crate::requests::{QuoteRequest, ValidJson};
use crate::state::AppState;

/// POST /pricing/quote
#[tracing::instrument(skip_all, fields(lines = req.cart_items.len()))]
pub async fn quote(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ValidJson(req): ValidJson<QuoteRequest>,
) -> Result<Json<PriceBreakdown>, ApiError> {
    let (coupon_code, existing) = req.validate()?;
    let user_id = identity.as_ref().map(|i| i.user_id.as_str());

    let codes = state
        .coupon_sessions
        .resolve(user_id, coupon_code, existing)
        .await;
    let catalog = state.db.catalog().snapshot().await?;

    let breakdown = price_cart(
        &PricingRequest {
            lines: &req.cart_items,
            coupon_code: codes.coupon_code,
            existing_codes: codes.existing,
            policy: req.policy.unwrap_or(state.policy),
            now: Utc::now(),
        },
        &catalog,
    )?;

    tracing::debug!(
        subtotal = breakdown.subtotal.cents(),
        total = breakdown.total.cents(),
        "quote computed"
    );

    Ok(Json(breakdown))
}
