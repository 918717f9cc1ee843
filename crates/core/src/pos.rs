//! Point-of-sale register cart.
//!
//! The register keeps its cart entirely in memory; nothing is persisted until
//! the cashier submits a transaction. Unlike the online cart, stock is checked
//! on every increase because the cashier is standing next to the shelf.

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tax::TaxRate;
use crate::totals::{PricedLine, Totals, compute_totals};
use crate::types::wire::null_as_default;
use crate::types::{CustomerId, PaymentMethod, ProductId, TransactionId, TransactionStatus};

/// Errors raised by register cart edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PosCartError {
    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("Cannot add more {product_name}: only {available} in stock")]
    InsufficientStock { product_name: String, available: u32 },

    #[error("Cannot exceed available stock of {available} for product {product_id}")]
    ExceedsStock {
        product_id: ProductId,
        available: u32,
    },

    #[error("Product {0} is not in the register cart")]
    NotInCart(ProductId),

    #[error("Cart is empty")]
    EmptyCart,
}

/// A product as seen by the cashier screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashierProduct {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_stock: u32,
}

/// One product on the register cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosLineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_code: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub available_stock: u32,
}

impl PricedLine for PosLineItem {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Cart held by the register screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosCart {
    lines: Vec<PosLineItem>,
}

impl PosCart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[PosLineItem] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&PosLineItem> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Scan or click a product: add one unit.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// `OutOfStock` when the product has no stock, `InsufficientStock` when
    /// the line already holds every available unit.
    pub fn add_product(&mut self, product: &CashierProduct) -> Result<u32, PosCartError> {
        if product.available_stock == 0 {
            return Err(PosCartError::OutOfStock(product.product_name.clone()));
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.product_id)
        {
            if line.quantity >= product.available_stock {
                return Err(PosCartError::InsufficientStock {
                    product_name: product.product_name.clone(),
                    available: product.available_stock,
                });
            }
            line.quantity += 1;
            line.available_stock = product.available_stock;
            return Ok(line.quantity);
        }

        self.lines.push(PosLineItem {
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            product_code: product.product_code.clone(),
            unit_price: product.unit_price,
            quantity: 1,
            available_stock: product.available_stock,
        });
        Ok(1)
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// `NotInCart` for unknown products, `ExceedsStock` above available stock.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), PosCartError> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(PosCartError::NotInCart(product_id))?;

        if quantity > line.available_stock {
            return Err(PosCartError::ExceedsStock {
                product_id,
                available: line.available_stock,
            });
        }

        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    #[must_use]
    pub fn totals(&self, tax_rate: Option<TaxRate>) -> Totals {
        compute_totals(&self.lines, tax_rate)
    }

    /// Build the payload submitted when the cashier completes the sale.
    ///
    /// The tax amount is the calculator's tax rounded to two places, which is
    /// what the receipt shows.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` if there is nothing to sell.
    pub fn transaction_request(
        &self,
        tax_rate: Option<TaxRate>,
        payment_method: PaymentMethod,
        customer_id: Option<CustomerId>,
        notes: Option<String>,
    ) -> Result<PosTransactionRequest, PosCartError> {
        if self.is_empty() {
            return Err(PosCartError::EmptyCart);
        }

        let totals = self.totals(tax_rate);

        Ok(PosTransactionRequest {
            customer_id,
            items: self
                .lines
                .iter()
                .map(|l| PosTransactionItem {
                    product_id: l.product_id,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    discount_amount: Decimal::ZERO,
                })
                .collect(),
            discount_amount: Decimal::ZERO,
            tax_amount: totals
                .tax
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            payment_method,
            notes,
        })
    }
}

/// Body of `POST cashier/transactions`. A missing customer is a walk-in sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosTransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub items: Vec<PosTransactionItem>,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosTransactionItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
}

/// Completed sale as returned by the backend, used to print the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosTransactionResponse {
    pub transaction_id: TransactionId,
    pub bill_number: String,
    #[serde(default)]
    pub transaction_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<PosReceiptLine>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub net_amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TransactionStatus,
    #[serde(default)]
    pub cashier_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosReceiptLine {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default)]
    pub product_code: Option<String>,
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub line_total: Decimal,
}
