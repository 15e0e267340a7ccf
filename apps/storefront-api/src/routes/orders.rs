//! Order settlement endpoints.
//!
//! `confirm` is called by the payment collaborator (role `payments`) and may
//! be delivered more than once. `revert` and `items` belong to the customer.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use storefront_core::validation::validate_order_id;
use storefront_core::CartItem;

use crate::auth::{AuthenticatedUser, PAYMENTS_ROLE};
use crate::error::ApiError;
use crate::routes::{require_profile, TransitionResponse};
use crate::state::AppState;

/// POST /orders/{orderId}/confirm: CHECKED_OUT → PURCHASED, idempotent.
#[tracing::instrument(skip_all, fields(order_id = %order_id))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(order_id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    caller.require_role(PAYMENTS_ROLE)?;
    validate_order_id(&order_id)?;

    let count = state.db.cart_items().confirm_purchase(&order_id).await?;

    Ok(Json(TransitionResponse::new(order_id, count)))
}

/// POST /orders/{orderId}/revert: CHECKED_OUT → IN_CART.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, order_id = %order_id))]
pub async fn revert(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<String>,
) -> Result<Json<TransitionResponse>, ApiError> {
    validate_order_id(&order_id)?;
    require_profile(&state, &user.user_id).await?;

    let count = state
        .db
        .cart_items()
        .revert_checkout(&user.user_id, &order_id)
        .await?;

    Ok(Json(TransitionResponse::new(order_id, count)))
}

/// GET /orders/{orderId}/items: the frozen rows of one of the user's orders.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, order_id = %order_id))]
pub async fn items(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<CartItem>>, ApiError> {
    validate_order_id(&order_id)?;
    require_profile(&state, &user.user_id).await?;

    let items = state
        .db
        .cart_items()
        .items_for_order(&user.user_id, &order_id)
        .await?;

    if items.is_empty() {
        return Err(ApiError::NotFound("Order".to_string()));
    }

    Ok(Json(items))
}
