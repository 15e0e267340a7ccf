//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.cart_items().begin_checkout(user_id, order_id)             │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── add_item / update_quantity / remove_item   (IN_CART only)         │
//! │  ├── begin_checkout     IN_CART     → CHECKED_OUT                      │
//! │  ├── confirm_purchase   CHECKED_OUT → PURCHASED                        │
//! │  └── revert_checkout    CHECKED_OUT → IN_CART                          │
//! │       │                                                                 │
//! │       │  One conditional UPDATE per transition                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CartRepository`](cart::CartRepository) - Persisted cart rows and their status transitions
//! - [`CatalogRepository`](catalog::CatalogRepository) - Promotion groups, coupons, snapshots
//! - [`ProfileRepository`](profile::ProfileRepository) - Customer profiles

pub mod cart;
pub mod catalog;
pub mod profile;
