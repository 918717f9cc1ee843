//! In-memory cart backend for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use giftshop_core::{CartLineItem, CheckoutRequest, CheckoutResponse, OrderId, Product, ProductId};
use rust_decimal::Decimal;
use serde_json::Value;

use super::CartBackend;
use crate::checkout::OrderBackend;
use crate::error::ApiError;

#[derive(Default)]
struct FakeState {
    online: bool,
    fail_fetch: bool,
    catalog: Vec<Product>,
    lines: Vec<CartLineItem>,
    raw_cart: Option<Value>,
    orders: Vec<CheckoutRequest>,
    calls: Vec<&'static str>,
}

/// Backend that keeps a server cart in memory and can be switched offline.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    /// An online backend selling `catalog`.
    pub fn online(catalog: Vec<Product>) -> Self {
        let backend = Self::default();
        backend.with_state(|s| {
            s.online = true;
            s.catalog = catalog;
        });
        backend
    }

    /// A backend that refuses every call, like a guest session.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.with_state(|s| s.online = online);
    }

    /// Let mutations succeed but make the follow-up fetch fail.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.with_state(|s| s.fail_fetch = fail);
    }

    /// Server-side price change, visible on the next fetch.
    pub fn set_price(&self, product_id: ProductId, price: Decimal) {
        self.with_state(|s| {
            for product in s.catalog.iter_mut().filter(|p| p.product_id == product_id) {
                product.online_price = price;
            }
            for line in s.lines.iter_mut().filter(|l| l.product_id == product_id) {
                line.online_price = price;
            }
        });
    }

    /// Serve `body` as the stored cart; it is decoded on the next fetch.
    pub fn set_server_json(&self, body: Value) {
        self.with_state(|s| s.raw_cart = Some(body));
    }

    pub fn server_lines(&self) -> Vec<CartLineItem> {
        self.with_state(|s| s.lines.clone())
    }

    pub fn orders(&self) -> Vec<CheckoutRequest> {
        self.with_state(|s| s.orders.clone())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.with_state(|s| s.calls.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    fn call(&self, name: &'static str) -> Result<(), ApiError> {
        self.with_state(|s| {
            s.calls.push(name);
            if s.online {
                Ok(())
            } else {
                Err(ApiError::Unauthorized { status: 401 })
            }
        })
    }
}

impl CartBackend for FakeBackend {
    async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, ApiError> {
        self.call("fetch")?;
        self.with_state(|s| {
            if s.fail_fetch {
                Err(ApiError::Status {
                    status: 500,
                    message: "fetch failed".to_string(),
                })
            } else {
                if let Some(body) = s.raw_cart.take() {
                    s.lines = serde_json::from_value(body)?;
                }
                Ok(s.lines.clone())
            }
        })
    }

    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.call("add")?;
        self.with_state(|s| -> Result<(), ApiError> {
            let product = s
                .catalog
                .iter()
                .find(|p| p.product_id == product_id)
                .cloned()
                .ok_or_else(|| ApiError::Rejected("Product not found".to_string()))?;

            match s.lines.iter_mut().find(|l| l.product_id == product_id) {
                Some(line) => line.quantity += quantity,
                None => s.lines.push(CartLineItem::from_product(&product, quantity)),
            }
            Ok(())
        })
    }

    async fn remove_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.call("remove")?;
        self.with_state(|s| s.lines.retain(|l| l.product_id != product_id));
        Ok(())
    }

    async fn update_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.call("update")?;
        self.with_state(|s| -> Result<(), ApiError> {
            let line = s
                .lines
                .iter_mut()
                .find(|l| l.product_id == product_id)
                .ok_or_else(|| ApiError::Rejected("Cart item not found".to_string()))?;
            line.quantity = quantity;
            Ok(())
        })
    }

    async fn clear(&self) -> Result<(), ApiError> {
        self.call("clear")?;
        self.with_state(|s| s.lines.clear());
        Ok(())
    }
}

impl OrderBackend for FakeBackend {
    async fn place_order(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ApiError> {
        self.call("checkout")?;
        self.with_state(|s| -> Result<CheckoutResponse, ApiError> {
            let mut total = Decimal::ZERO;
            for item in &request.items {
                let product = s
                    .catalog
                    .iter()
                    .find(|p| p.product_id == item.product_id)
                    .ok_or_else(|| ApiError::Rejected("Product not found".to_string()))?;
                if item.quantity > product.current_stock {
                    return Err(ApiError::Rejected(format!(
                        "Checkout failed: Insufficient stock for product: {}",
                        product.product_name
                    )));
                }
                total += product.online_price * Decimal::from(item.quantity);
            }
            for item in &request.items {
                if let Some(product) = s.catalog.iter_mut().find(|p| p.product_id == item.product_id) {
                    product.current_stock -= item.quantity;
                }
            }

            s.orders.push(request.clone());
            let order_number = i64::try_from(s.orders.len()).unwrap();
            Ok(CheckoutResponse {
                order_id: Some(OrderId::new(order_number)),
                transaction_id: None,
                bill_number: format!("DVP-{order_number:04}"),
                reference_number: None,
                total_amount: total,
                tax_amount: Decimal::ZERO,
                net_amount: total,
                order_status: Some("pending".to_string()),
                placed_at: None,
                message: Some("Order placed successfully".to_string()),
            })
        })
    }
}

/// A catalog product with a whole-rupee price.
pub fn product(id: i64, price: i64, stock: u32) -> Product {
    Product {
        product_id: ProductId::new(id),
        product_name: format!("Product {id}"),
        description: None,
        online_price: Decimal::new(price, 0),
        image_url: Some(format!("/images/{id}.jpg")),
        category_name: Some("Gifts".to_string()),
        category_id: None,
        current_stock: stock,
    }
}
