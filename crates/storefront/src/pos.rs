//! Register operations for the cashier screen.
//!
//! The register cart lives only in memory ([`PosCart`]); the backend is
//! consulted to resolve scanned barcodes and to record the finished sale.

use std::future::Future;

use giftshop_core::pos::{
    CashierProduct, PosCart, PosCartError, PosTransactionRequest, PosTransactionResponse,
};
use giftshop_core::{CustomerId, PaymentMethod, ProductId, TaxRate, Totals};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::error::{ApiError, add_breadcrumb};

/// Errors from register operations.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cart(#[from] PosCartError),
}

/// Cashier endpoints the register depends on.
pub trait RegisterBackend: Send + Sync + 'static {
    fn lookup_barcode(
        &self,
        barcode: &str,
    ) -> impl Future<Output = Result<CashierProduct, ApiError>> + Send;

    fn submit_transaction(
        &self,
        request: &PosTransactionRequest,
    ) -> impl Future<Output = Result<PosTransactionResponse, ApiError>> + Send;
}

impl RegisterBackend for ApiClient {
    async fn lookup_barcode(&self, barcode: &str) -> Result<CashierProduct, ApiError> {
        Self::lookup_barcode(self, barcode).await
    }

    async fn submit_transaction(
        &self,
        request: &PosTransactionRequest,
    ) -> Result<PosTransactionResponse, ApiError> {
        Self::submit_transaction(self, request).await
    }
}

/// A single till: a register cart plus the backend that prices and records it.
pub struct Register<B> {
    backend: B,
    cart: PosCart,
}

impl<B: RegisterBackend> Register<B> {
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            cart: PosCart::new(),
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &PosCart {
        &self.cart
    }

    /// Resolve a barcode and add one unit of the product.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Lookup failures and stock refusals; the cart is unchanged on error.
    #[instrument(skip(self))]
    pub async fn scan(&mut self, barcode: &str) -> Result<u32, RegisterError> {
        let product = self.backend.lookup_barcode(barcode).await?;
        Ok(self.cart.add_product(&product)?)
    }

    /// Add an already-resolved product (clicked from the product grid).
    ///
    /// # Errors
    ///
    /// Stock refusals from the register cart.
    pub fn add(&mut self, product: &CashierProduct) -> Result<u32, RegisterError> {
        Ok(self.cart.add_product(product)?)
    }

    /// # Errors
    ///
    /// `NotInCart` or `ExceedsStock` from the register cart.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RegisterError> {
        Ok(self.cart.update_quantity(product_id, quantity)?)
    }

    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.cart.remove(product_id)
    }

    pub fn clear(&mut self) {
        self.cart.clear();
    }

    #[must_use]
    pub fn totals(&self, tax_rate: Option<TaxRate>) -> Totals {
        self.cart.totals(tax_rate)
    }

    /// Submit the sale and empty the register.
    ///
    /// The cart is kept if the backend refuses the sale so the cashier can
    /// retry.
    ///
    /// # Errors
    ///
    /// `EmptyCart` when there is nothing to sell, or the backend error.
    #[instrument(skip(self, notes), fields(lines = self.cart.len()))]
    pub async fn complete_sale(
        &mut self,
        tax_rate: Option<TaxRate>,
        payment_method: PaymentMethod,
        customer_id: Option<CustomerId>,
        notes: Option<String>,
    ) -> Result<PosTransactionResponse, RegisterError> {
        let request = self
            .cart
            .transaction_request(tax_rate, payment_method, customer_id, notes)?;

        let response = match self.backend.submit_transaction(&request).await {
            Ok(response) => response,
            Err(e) => {
                let error = e.to_string();
                add_breadcrumb(
                    "pos",
                    "sale submission failed",
                    Some(&[("error", error.as_str())]),
                );
                return Err(e.into());
            }
        };

        info!(
            transaction_id = %response.transaction_id,
            bill_number = %response.bill_number,
            net = %response.net_amount,
            "Sale completed"
        );
        self.cart.clear();
        Ok(response)
    }
}
