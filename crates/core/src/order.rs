//! Online order placement payloads.
//!
//! Checkout turns the synchronized cart into a [`CheckoutRequest`]: one
//! `{productId, quantity}` entry per line plus where to ship and how the
//! customer pays. Prices are not sent; the backend reprices every line from
//! its own catalog and answers with a [`CheckoutResponse`].

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::types::wire::null_as_default;
use crate::types::{OrderId, PaymentMethod, ProductId, TransactionId};

const ADDRESS_LINE_MAX: usize = 255;
const CITY_MAX: usize = 100;
const POSTAL_CODE_MAX: usize = 20;

/// Reasons an order cannot be built from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Cannot place an order for an empty cart")]
    EmptyCart,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
}

/// Delivery address for an online order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub postal_code: String,
}

impl ShippingAddress {
    #[must_use]
    pub fn new(
        address_line1: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            address_line1: address_line1.into(),
            address_line2: None,
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Trim every field and check the lengths the backend enforces.
    ///
    /// A blank second address line is dropped.
    ///
    /// # Errors
    ///
    /// `MissingField` for a blank required field, `FieldTooLong` when a field
    /// exceeds its column width.
    pub fn normalized(&self) -> Result<Self, OrderError> {
        let address_line2 = self
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| bounded("addressLine2", line, ADDRESS_LINE_MAX))
            .transpose()?;

        Ok(Self {
            address_line1: required("addressLine1", &self.address_line1, ADDRESS_LINE_MAX)?,
            address_line2,
            city: required("city", &self.city, CITY_MAX)?,
            postal_code: required("postalCode", &self.postal_code, POSTAL_CODE_MAX)?,
        })
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, OrderError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OrderError::MissingField(field));
    }
    bounded(field, value, max)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, OrderError> {
    if value.chars().count() > max {
        return Err(OrderError::FieldTooLong { field, max });
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST online/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
}

impl Cart {
    /// Build the order payload for the cart's current lines.
    ///
    /// # Errors
    ///
    /// `EmptyCart` if the cart has no lines, or the address validation error.
    pub fn checkout_request(
        &self,
        shipping_address: &ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutRequest, OrderError> {
        if self.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        Ok(CheckoutRequest {
            items: self
                .lines()
                .iter()
                .map(|l| OrderItem {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
            shipping_address: shipping_address.normalized()?,
            payment_method,
            shipping_method: None,
        })
    }
}

/// Placed order as confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bill_number: String,
    /// Payment reference, e.g. `REF-CC2501011015300042`.
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub net_amount: Decimal,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub placed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub message: Option<String>,
}
