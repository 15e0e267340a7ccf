//! HTTP handlers.
//!
//! ```text
//! GET    /health                     health
//! POST   /bogo                       bogo::compute
//! POST   /coupon/apply               coupon::apply
//! POST   /coupon/auto-apply          coupon::auto_apply
//! POST   /pricing/quote              pricing::quote
//! GET    /cart                       cart::view
//! POST   /cart/items                 cart::add_item
//! PATCH  /cart/items/{id}            cart::update_item
//! DELETE /cart/items/{id}            cart::remove_item
//! POST   /cart/checkout              cart::checkout
//! POST   /orders/{orderId}/confirm   orders::confirm      (payments role)
//! POST   /orders/{orderId}/revert    orders::revert
//! GET    /orders/{orderId}/items     orders::items
//! ```

pub mod bogo;
pub mod cart;
pub mod coupon;
pub mod health;
pub mod orders;
pub mod pricing;

use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Result of a cart status transition. `count` 0 is a normal outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub success: bool,
    pub count: u64,
    pub order_id: String,
}

impl TransitionResponse {
    pub fn new(order_id: impl Into<String>, count: u64) -> Self {
        TransitionResponse {
            success: true,
            count,
            order_id: order_id.into(),
        }
    }
}

/// Cart operations need a finished onboarding.
pub(crate) async fn require_profile(state: &AppState, user_id: &str) -> Result<(), ApiError> {
    if state.db.profiles().exists(user_id).await? {
        Ok(())
    } else {
        tracing::debug!(user_id = %user_id, "authenticated user has no profile");
        Err(ApiError::ProfileNotFound)
    }
}
