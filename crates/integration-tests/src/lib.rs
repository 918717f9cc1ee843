//! Integration tests for the gift shop client.
//!
//! The tests drive the real `reqwest`-based [`ApiClient`] against
//! [`FakeBackend`], an `axum` server on an ephemeral local port that speaks
//! the same `{success, message, data}` envelope as the production API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p giftshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart synchronizer over HTTP (reconcile and fallback paths)
//! - `tax_settings` - Tax endpoint parsing and caching
//! - `checkout` - Online order placement
//! - `pos_register` - Barcode lookup and transaction submission

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use giftshop_core::pos::{CashierProduct, PosTransactionRequest};
use giftshop_core::{
    CartLineItem, CheckoutRequest, PaymentMethod, Product, ProductId, TaxRate,
};
use giftshop_storefront::{ApiClient, GiftshopConfig};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Token the fake backend accepts.
pub const TEST_TOKEN: &str = "test-token";

/// Everything the fake backend knows. Tests seed it and inspect it.
#[derive(Debug, Clone, Default)]
pub struct BackendState {
    pub catalog: Vec<Product>,
    pub lines: Vec<CartLineItem>,
    /// Served verbatim by `GET online/cart` instead of `lines` when set.
    pub raw_cart: Option<Value>,
    pub cashier_products: Vec<CashierProduct>,
    /// Raw `taxRate` value; `Value::Null` omits the field.
    pub tax_rate: Value,
    /// Cart mutations answer 500.
    pub fail_mutations: bool,
    /// The settings endpoint answers 503.
    pub fail_settings: bool,
    pub tax_fetches: usize,
    pub transactions: Vec<PosTransactionRequest>,
    pub orders: Vec<CheckoutRequest>,
    /// `METHOD path` of every request received.
    pub requests: Vec<String>,
}

type SharedState = Arc<Mutex<BackendState>>;

/// In-process gift shop backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving `state`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(state: BackendState) -> Self {
        let state = Arc::new(Mutex::new(state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read fake backend address");

        let app = router(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Configuration for a logged-in customer.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse.
    #[must_use]
    pub fn config(&self) -> GiftshopConfig {
        self.guest_config().with_token(TEST_TOKEN)
    }

    /// Configuration without a token.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse.
    #[must_use]
    pub fn guest_config(&self) -> GiftshopConfig {
        GiftshopConfig::for_api_url(&self.base_url()).expect("Invalid fake backend URL")
    }

    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("Failed to create API client")
    }

    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn guest_client(&self) -> ApiClient {
        ApiClient::new(&self.guest_config()).expect("Failed to create API client")
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        with_state(&self.state, f)
    }

    #[must_use]
    pub fn snapshot(&self) -> BackendState {
        self.with_state(|s| s.clone())
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut BackendState) -> R) -> R {
    f(&mut state.lock().unwrap_or_else(PoisonError::into_inner))
}

// =============================================================================
// Routes
// =============================================================================

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/online/cart", get(get_cart))
        .route("/api/online/cart/add", post(add_to_cart))
        .route("/api/online/cart/remove/{product_id}", delete(remove_from_cart))
        .route("/api/online/cart/update", put(update_cart))
        .route("/api/online/cart/clear", delete(clear_cart))
        .route("/api/online/checkout", post(checkout))
        .route("/api/settings/tax", get(get_tax))
        .route("/api/cashier/products/barcode/{code}", get(lookup_barcode))
        .route("/api/cashier/transactions", post(create_transaction))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemBody {
    product_id: ProductId,
    quantity: u32,
}

fn success(data: Value) -> Response {
    Json(json!({"success": true, "message": "OK", "data": data})).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TEST_TOKEN}"))
}

/// Record the request and check credentials.
fn admit(state: &SharedState, headers: &HeaderMap, request: String) -> Result<(), Response> {
    with_state(state, |s| s.requests.push(request));
    if is_authorized(headers) {
        Ok(())
    } else {
        Err(failure(StatusCode::UNAUTHORIZED, "Authentication required"))
    }
}

fn mutations_failing(state: &SharedState) -> bool {
    with_state(state, |s| s.fail_mutations)
}

async fn get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(response) = admit(&state, &headers, "GET online/cart".to_string()) {
        return response;
    }
    with_state(&state, |s| match &s.raw_cart {
        Some(body) => success(body.clone()),
        None => success(json!(s.lines)),
    })
}

async fn add_to_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CartItemBody>,
) -> Response {
    if let Err(response) = admit(&state, &headers, "POST online/cart/add".to_string()) {
        return response;
    }
    if mutations_failing(&state) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add to cart");
    }

    with_state(&state, |s| {
        let Some(product) = s
            .catalog
            .iter()
            .find(|p| p.product_id == body.product_id)
            .cloned()
        else {
            return failure(
                StatusCode::BAD_REQUEST,
                "Failed to add to cart: Product not found",
            );
        };

        match s.lines.iter_mut().find(|l| l.product_id == body.product_id) {
            Some(line) => line.quantity += body.quantity,
            None => s
                .lines
                .push(CartLineItem::from_product(&product, body.quantity)),
        }
        success(Value::Null)
    })
}

async fn remove_from_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
) -> Response {
    let request = format!("DELETE online/cart/remove/{product_id}");
    if let Err(response) = admit(&state, &headers, request) {
        return response;
    }
    if mutations_failing(&state) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to remove from cart");
    }

    with_state(&state, |s| s.lines.retain(|l| l.product_id != product_id));
    success(Value::Null)
}

async fn update_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CartItemBody>,
) -> Response {
    if let Err(response) = admit(&state, &headers, "PUT online/cart/update".to_string()) {
        return response;
    }
    if mutations_failing(&state) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update cart");
    }

    with_state(&state, |s| {
        match s.lines.iter_mut().find(|l| l.product_id == body.product_id) {
            Some(line) => {
                line.quantity = body.quantity;
                success(Value::Null)
            }
            None => failure(StatusCode::BAD_REQUEST, "Cart item not found"),
        }
    })
}

async fn clear_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(response) = admit(&state, &headers, "DELETE online/cart/clear".to_string()) {
        return response;
    }
    if mutations_failing(&state) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to clear cart");
    }

    with_state(&state, |s| s.lines.clear());
    success(Value::Null)
}

/// Reprices from the catalog and takes stock; leaves the cart alone.
async fn checkout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    if let Err(response) = admit(&state, &headers, "POST online/checkout".to_string()) {
        return response;
    }

    with_state(&state, |s| {
        let mut total = Decimal::ZERO;
        for item in &request.items {
            let Some(product) = s.catalog.iter().find(|p| p.product_id == item.product_id) else {
                return failure(
                    StatusCode::BAD_REQUEST,
                    &format!("Checkout failed: Product not found: {}", item.product_id),
                );
            };
            if product.current_stock < item.quantity {
                return failure(
                    StatusCode::BAD_REQUEST,
                    &format!(
                        "Checkout failed: Insufficient stock for product: {}",
                        product.product_name
                    ),
                );
            }
            total += product.online_price * Decimal::from(item.quantity);
        }

        for item in &request.items {
            if let Some(product) = s
                .catalog
                .iter_mut()
                .find(|p| p.product_id == item.product_id)
            {
                product.current_stock -= item.quantity;
            }
        }

        let tax = (total * TaxRate::lenient(Some(&s.tax_rate)).as_decimal())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        s.orders.push(request.clone());
        let number = s.orders.len();

        success(json!({
            "orderId": number,
            "transactionId": 500 + number,
            "billNumber": format!("DVP261017{number}103000"),
            "referenceNumber": format!("REF-{}2610171030000{number:03}", reference_code(&request)),
            "totalAmount": total,
            "taxAmount": tax,
            "netAmount": total + tax,
            "orderStatus": "pending",
            "placedAt": "2026-10-17T10:30:00",
            "message": "Order placed successfully",
        }))
    })
}

fn reference_code(request: &CheckoutRequest) -> &'static str {
    match request.payment_method {
        PaymentMethod::CashOnDelivery => "COD",
        PaymentMethod::CreditCard => "CC",
        PaymentMethod::DebitCard => "DC",
        PaymentMethod::Cash => "CASH",
    }
}

/// Public endpoint; no token needed.
async fn get_tax(State(state): State<SharedState>) -> Response {
    with_state(&state, |s| {
        s.requests.push("GET settings/tax".to_string());
        s.tax_fetches += 1;

        if s.fail_settings {
            return failure(StatusCode::SERVICE_UNAVAILABLE, "Settings unavailable");
        }

        if s.tax_rate.is_null() {
            success(json!({}))
        } else {
            success(json!({"taxRate": s.tax_rate}))
        }
    })
}

async fn lookup_barcode(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    let request = format!("GET cashier/products/barcode/{code}");
    if let Err(response) = admit(&state, &headers, request) {
        return response;
    }

    with_state(&state, |s| {
        s.cashier_products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(code.as_str()))
            .map_or_else(
                || failure(StatusCode::NOT_FOUND, "Product not found"),
                |p| success(json!(p)),
            )
    })
}

async fn create_transaction(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(request): Json<PosTransactionRequest>,
) -> Response {
    if let Err(response) = admit(&state, &headers, "POST cashier/transactions".to_string()) {
        return response;
    }

    with_state(&state, |s| {
        let mut items = Vec::with_capacity(request.items.len());
        let mut subtotal = Decimal::ZERO;

        for item in &request.items {
            let Some(product) = s
                .cashier_products
                .iter_mut()
                .find(|p| p.product_id == item.product_id)
            else {
                return failure(StatusCode::BAD_REQUEST, "Product not found");
            };
            if product.available_stock < item.quantity {
                return failure(
                    StatusCode::BAD_REQUEST,
                    &format!("Insufficient stock for {}", product.product_name),
                );
            }
            product.available_stock -= item.quantity;

            let line_total = item.unit_price * Decimal::from(item.quantity);
            subtotal += line_total;
            items.push(json!({
                "productId": item.product_id,
                "productName": product.product_name,
                "productCode": product.product_code,
                "quantity": item.quantity,
                "unitPrice": item.unit_price,
                "discountAmount": item.discount_amount,
                "lineTotal": line_total,
            }));
        }

        s.transactions.push(request.clone());
        let number = s.transactions.len();

        success(json!({
            "transactionId": number,
            "billNumber": format!("BILL-{number:05}"),
            "transactionDate": "2026-10-17T10:30:00",
            "customerName": request.customer_id.map(|_| "Registered Customer"),
            "items": items,
            "totalAmount": subtotal,
            "taxAmount": request.tax_amount,
            "discountAmount": request.discount_amount,
            "netAmount": subtotal + request.tax_amount - request.discount_amount,
            "paymentMethod": request.payment_method,
            "status": "completed",
            "cashierName": "Test Cashier",
        }))
    })
}

// =============================================================================
// Fixtures
// =============================================================================

/// Online catalog product.
#[must_use]
pub fn product(id: i64, name: &str, price: Decimal, stock: u32) -> Product {
    Product {
        product_id: ProductId::new(id),
        product_name: name.to_string(),
        description: None,
        online_price: price,
        image_url: Some(format!("/uploads/products/{id}.jpg")),
        category_name: Some("Handicrafts".to_string()),
        category_id: None,
        current_stock: stock,
    }
}

/// Register product with a barcode.
#[must_use]
pub fn cashier_product(id: i64, barcode: &str, price: Decimal, stock: u32) -> CashierProduct {
    CashierProduct {
        product_id: ProductId::new(id),
        product_name: format!("Item {id}"),
        product_code: Some(format!("GS-{id:04}")),
        barcode: Some(barcode.to_string()),
        unit_price: price,
        category_name: Some("Souvenirs".to_string()),
        available_stock: stock,
    }
}
