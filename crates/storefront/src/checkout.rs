//! Checkout: the summary shared by the cart and checkout views, and order
//! placement.

use std::future::Future;

use giftshop_core::{
    CartLineItem, CheckoutRequest, CheckoutResponse, OrderError, PaymentMethod, ShippingAddress,
    TaxRate, Totals, format_lkr,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::cart::{CartBackend, CartSynchronizer};
use crate::error::{ApiError, add_breadcrumb};
use crate::settings::{SettingsBackend, TaxRateCache};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Order endpoint used at checkout.
pub trait OrderBackend: Send + Sync + 'static {
    fn place_order(
        &self,
        request: &CheckoutRequest,
    ) -> impl Future<Output = Result<CheckoutResponse, ApiError>> + Send;
}

impl OrderBackend for ApiClient {
    async fn place_order(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ApiError> {
        Self::place_order(self, request).await
    }
}

/// Lines and amounts as shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub lines: Vec<CartLineItem>,
    pub tax_rate: TaxRate,
    pub totals: Totals,
    /// The cart may not match the server (last change was applied locally).
    pub stale: bool,
}

impl CheckoutSummary {
    /// Snapshot the cart and price it at the current store tax rate.
    pub async fn summarize<B, S>(cart: &CartSynchronizer<B>, tax: &TaxRateCache<S>) -> Self
    where
        B: CartBackend,
        S: SettingsBackend,
    {
        let tax_rate = tax.current().await;
        let snapshot = cart.cart().await;
        let stale = cart.is_stale().await;
        let totals = snapshot.totals(Some(tax_rate));

        Self {
            lines: snapshot.into_lines(),
            tax_rate,
            totals,
            stale,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Label for the tax row, e.g. `Tax (5%)`.
    #[must_use]
    pub fn tax_label(&self) -> String {
        format!("Tax ({})", self.tax_rate)
    }

    /// `(label, amount)` rows for the totals block.
    #[must_use]
    pub fn rows(&self) -> [(String, String); 3] {
        [
            ("Subtotal".to_string(), format_lkr(self.totals.subtotal)),
            (self.tax_label(), format_lkr(self.totals.tax)),
            ("Total".to_string(), format_lkr(self.totals.total)),
        ]
    }
}

// =============================================================================
// Order placement
// =============================================================================

impl<B: CartBackend + OrderBackend> CartSynchronizer<B> {
    /// Order everything in the cart, then empty it.
    ///
    /// The order carries the local lines as they stand, even when the cart is
    /// stale; the backend prices and stock-checks each line itself. The cart
    /// is kept when the order fails so the customer can retry.
    ///
    /// # Errors
    ///
    /// `Order` when the cart is empty or the address is incomplete (no
    /// backend call is made), `Api` when the backend refuses the order.
    #[instrument(skip(self, shipping_address))]
    pub async fn place_order(
        &self,
        shipping_address: &ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutResponse, CheckoutError> {
        let request = self
            .cart()
            .await
            .checkout_request(shipping_address, payment_method)?;

        let response = match self.backend().place_order(&request).await {
            Ok(response) => response,
            Err(e) => {
                let error = e.to_string();
                add_breadcrumb(
                    "checkout",
                    "order placement failed",
                    Some(&[("error", error.as_str())]),
                );
                return Err(e.into());
            }
        };

        info!(
            order_id = ?response.order_id,
            bill_number = %response.bill_number,
            net = %response.net_amount,
            "Order placed"
        );
        self.clear().await;
        Ok(response)
    }
}
