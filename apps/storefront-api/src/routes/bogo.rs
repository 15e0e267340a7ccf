//! BOGO preview endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use storefront_core::bogo::{compute_bogo, BogoResult};
use storefront_core::LocalizedMessage;

use crate::error::ApiError;
use crate::requests::{BogoRequest, ValidJson};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BogoResponse {
    #[serde(flatten)]
    pub result: BogoResult,
    pub message: LocalizedMessage,
}

/// POST /bogo: pair discounts for a cart line set.
#[tracing::instrument(skip_all, fields(lines = req.items.len()))]
pub async fn compute(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<BogoRequest>,
) -> Result<Json<BogoResponse>, ApiError> {
    req.validate()?;

    let catalog = state.db.catalog().snapshot().await?;
    let result = compute_bogo(&req.items, &catalog);

    tracing::debug!(
        discount = result.bogo_discount_amount.cents(),
        pairs = result.pairs.len(),
        "bogo computed"
    );

    let message = LocalizedMessage::bogo_summary(result.bogo_discount_amount, result.has_leftover);
    Ok(Json(BogoResponse { result, message }))
}
