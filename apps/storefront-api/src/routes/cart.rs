//! Persisted cart endpoints for the signed-in customer.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use storefront_core::pricing::{price_cart, PriceBreakdown, PricingRequest};
use storefront_core::validation::validate_uuid;
use storefront_core::{CartItem, CartLine};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::requests::{AddCartItemRequest, CheckoutRequest, UpdateQuantityRequest, ValidJson};
use crate::routes::{require_profile, TransitionResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub pricing: PriceBreakdown,
}

/// GET /cart: live IN_CART rows with their current price breakdown,
/// including the customer's most recently applied coupon.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn view(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<CartResponse>, ApiError> {
    require_profile(&state, &user.user_id).await?;

    let items = state.db.cart_items().list_in_cart(&user.user_id).await?;
    let lines: Vec<CartLine> = items.iter().map(CartItem::to_cart_line).collect();

    let codes = state
        .coupon_sessions
        .resolve(Some(&user.user_id), None, Vec::new())
        .await;
    let catalog = state.db.catalog().snapshot().await?;

    let pricing = price_cart(
        &PricingRequest {
            lines: &lines,
            coupon_code: codes.coupon_code,
            existing_codes: codes.existing,
            policy: state.policy,
            now: Utc::now(),
        },
        &catalog,
    )?;

    Ok(Json(CartResponse { items, pricing }))
}

/// POST /cart/items: add or merge a variant.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, sku = %req.sku))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(req): ValidJson<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartItem>), ApiError> {
    req.validate()?;
    require_profile(&state, &user.user_id).await?;

    let item = state
        .db
        .cart_items()
        .add_item(&user.user_id, &req.into_new_item())
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /cart/items/{id}: set a quantity; 0 removes the line.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, id = %id))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateQuantityRequest>,
) -> Result<Json<CartItem>, ApiError> {
    validate_uuid(&id)?;
    req.validate()?;
    require_profile(&state, &user.user_id).await?;

    let item = state
        .db
        .cart_items()
        .update_quantity(&user.user_id, &id, req.quantity)
        .await?;

    Ok(Json(item))
}

/// DELETE /cart/items/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, id = %id))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id)?;
    require_profile(&state, &user.user_id).await?;

    state.db.cart_items().remove_item(&user.user_id, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /cart/checkout: freeze the cart under a provisional order id.
///
/// `count` 0 means nothing was checked out: the cart was empty or a
/// concurrent checkout already took the rows.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(req): ValidJson<CheckoutRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    req.validate()?;
    require_profile(&state, &user.user_id).await?;

    let order_id = req
        .order_id
        .unwrap_or_else(|| format!("ord_{}", Uuid::new_v4().simple()));

    let count = state
        .db
        .cart_items()
        .begin_checkout(&user.user_id, &order_id)
        .await?;

    if count > 0 {
        state.coupon_sessions.clear(&user.user_id).await;
    }

    Ok(Json(TransitionResponse::new(order_id, count)))
}
