//! # Storefront API
//!
//! JSON HTTP surface over the pricing engine and the cart state machine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront API Server                            │
//! │                                                                         │
//! │  Browser ──► axum (8080) ──► ValidJson<Request> ──► validate()         │
//! │                                   │                                     │
//! │                 ┌─────────────────┼───────────────────┐                 │
//! │                 ▼                 ▼                   ▼                 │
//! │          catalog snapshot   storefront-core     CartRepository          │
//! │          (one per request)  bogo / coupon /     (conditional UPDATEs)   │
//! │                             price_cart                                  │
//! │                                                                         │
//! │  Identity: bearer JWT ──► IdentityVerifier ──► user id                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HOST` / `PORT` - Listen address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH` - SQLite file (default: ./storefront.db)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for HS256 bearer tokens
//! - `COUPON_SESSION_TTL_SECS` - Applied-code memory (default: 1800)
//! - `COUPON_SESSION_CAPACITY` - Users remembered (default: 10000)
//! - `COUPON_POLICY` - `explicit_only`, `explicit_then_auto` or
//!   `explicit_with_auto_fallback` (required)

pub mod auth;
pub mod config;
pub mod error;
pub mod requests;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bogo", post(routes::bogo::compute))
        .route("/coupon/apply", post(routes::coupon::apply))
        .route("/coupon/auto-apply", post(routes::coupon::auto_apply))
        .route("/pricing/quote", post(routes::pricing::quote))
        .route("/cart", get(routes::cart::view))
        .route("/cart/items", post(routes::cart::add_item))
        .route(
            "/cart/items/{id}",
            patch(routes::cart::update_item).delete(routes::cart::remove_item),
        )
        .route("/cart/checkout", post(routes::cart::checkout))
        .route("/orders/{order_id}/confirm", post(routes::orders::confirm))
        .route("/orders/{order_id}/revert", post(routes::orders::revert))
        .route("/orders/{order_id}/items", get(routes::orders::items))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
