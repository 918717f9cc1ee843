//! Online cart model.
//!
//! A [`Cart`] is an ordered list of [`CartLineItem`]s keyed by product: a
//! product appears at most once, and adding it again increments the existing
//! line. The same type holds both the server-authoritative cart and the local
//! optimistic copy used when the server cannot be reached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tax::TaxRate;
use crate::totals::{PricedLine, Totals, compute_totals, subtotal};
use crate::types::wire::null_as_default;
use crate::types::{CategoryId, ProductId};

/// An online product as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub online_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_stock: u32,
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    /// Unit price for online purchase.
    #[serde(default, deserialize_with = "null_as_default")]
    pub online_price: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
    /// Stock snapshot taken when the line was fetched or added. May be stale.
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_stock: u32,
}

impl CartLineItem {
    /// Build a line from a product record and a quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            image_url: product.image_url.clone(),
            category_name: product.category_name.clone(),
            online_price: product.online_price,
            quantity,
            current_stock: product.current_stock,
        }
    }

    /// Whether `requested` fits within the cached stock snapshot.
    #[must_use]
    pub const fn has_stock_for(&self, requested: u32) -> bool {
        requested <= self.current_stock
    }
}

impl PricedLine for CartLineItem {
    fn unit_price(&self) -> Decimal {
        self.online_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Ordered collection of line items, unique by product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from server lines.
    ///
    /// Lines repeating a product are folded into the first occurrence so the
    /// one-line-per-product invariant holds whatever the server sends.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            match cart.line_mut(line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLineItem> {
        self.lines
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLineItem> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Add `quantity` of `product`: increments an existing line or appends a
    /// new one built from the product fields.
    pub fn add_product(&mut self, product: &Product, quantity: u32) {
        match self.line_mut(product.product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self
                .lines
                .push(CartLineItem::from_product(product, quantity)),
        }
    }

    /// Drop the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Set a line's quantity without any stock check. Absent lines are
    /// left alone; returns whether a line was updated.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities across all lines, for the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of `online_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        subtotal(&self.lines)
    }

    /// Subtotal, tax and total for this cart.
    #[must_use]
    pub fn totals(&self, tax_rate: Option<TaxRate>) -> Totals {
        compute_totals(&self.lines, tax_rate)
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<CartLineItem>::deserialize(deserializer).map(Self::from_lines)
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(lines: Vec<CartLineItem>) -> Self {
        Self::from_lines(lines)
    }
}
