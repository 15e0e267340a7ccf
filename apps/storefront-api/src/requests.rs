//! Request schemas.
//!
//! One explicit type per operation. Unknown fields are rejected and every
//! request is validated by its `validate` method before any pricing or
//! persistence runs.

use axum::extract::FromRequest;
use serde::Deserialize;

use storefront_core::pricing::CouponPolicy;
use storefront_core::validation::{
    validate_add_quantity, validate_cart_lines, validate_coupon_code, validate_existing_codes,
    validate_line_quantity, validate_order_id, validate_price_cents, validate_sku, validate_slug,
    ValidationResult,
};
use storefront_core::{CartLine, Money};
use storefront_db::NewCartItem;

use crate::error::ApiError;

/// `Json` whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BogoRequest {
    pub items: Vec<CartLine>,
}

impl BogoRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_cart_lines(&self.items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyCouponRequest {
    pub code: String,
    pub cart_items: Vec<CartLine>,
    #[serde(default)]
    pub existing_coupon_codes: Vec<String>,
}

impl ApplyCouponRequest {
    /// Returns the normalized code and existing codes.
    pub fn validate(&self) -> ValidationResult<(String, Vec<String>)> {
        validate_cart_lines(&self.cart_items)?;
        let code = validate_coupon_code(&self.code)?;
        let existing = validate_existing_codes(&self.existing_coupon_codes)?;
        Ok((code, existing))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AutoApplyRequest {
    pub cart_items: Vec<CartLine>,
    #[serde(default)]
    pub existing_coupon_codes: Vec<String>,
}

impl AutoApplyRequest {
    pub fn validate(&self) -> ValidationResult<Vec<String>> {
        validate_cart_lines(&self.cart_items)?;
        validate_existing_codes(&self.existing_coupon_codes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuoteRequest {
    pub cart_items: Vec<CartLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub existing_coupon_codes: Vec<String>,
    /// Overrides the server policy for this quote.
    #[serde(default)]
    pub policy: Option<CouponPolicy>,
}

impl QuoteRequest {
    pub fn validate(&self) -> ValidationResult<(Option<String>, Vec<String>)> {
        validate_cart_lines(&self.cart_items)?;
        let code = self
            .coupon_code
            .as_deref()
            .map(validate_coupon_code)
            .transpose()?;
        let existing = validate_existing_codes(&self.existing_coupon_codes)?;
        Ok((code, existing))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub order_id: Option<String>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        match &self.order_id {
            Some(order_id) => validate_order_id(order_id),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddCartItemRequest {
    pub sku: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub sale_price: Option<Money>,
}

impl AddCartItemRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_sku(&self.sku)?;
        validate_slug("color", self.color.as_deref())?;
        validate_slug("size", self.size.as_deref())?;
        validate_add_quantity(self.quantity)?;
        validate_price_cents("unitPrice", self.unit_price.cents())?;
        if let Some(sale) = self.sale_price {
            validate_price_cents("salePrice", sale.cents())?;
        }
        Ok(())
    }

    pub fn into_new_item(self) -> NewCartItem {
        NewCartItem {
            base_sku: self.sku,
            color_slug: self.color,
            size_slug: self.size,
            quantity: self.quantity,
            unit_price: self.unit_price,
            sale_price: self.sale_price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

impl UpdateQuantityRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_line_quantity(self.quantity)
    }
}
