//! Gift shop backend REST client.
//!
//! Uses `reqwest` with JSON bodies. Every endpoint answers with the
//! `{success, message, data}` envelope; non-2xx statuses and `success: false`
//! both become [`ApiError`]s. When a bearer token is configured it is attached
//! to every request; the cart code never sees it.
//!
//! # Example
//!
//! ```rust,ignore
//! use giftshop_storefront::{ApiClient, GiftshopConfig};
//!
//! let config = GiftshopConfig::from_env()?;
//! let client = ApiClient::new(&config)?;
//!
//! let lines = client.get_cart().await?;
//! client.add_to_cart(ProductId::new(7), 1).await?;
//! let order = client.place_order(&request).await?;
//! ```

mod envelope;

use std::sync::Arc;

use giftshop_core::pos::{CashierProduct, PosTransactionRequest, PosTransactionResponse};
use giftshop_core::{CartLineItem, CheckoutRequest, CheckoutResponse, ProductId, TaxRate};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, instrument};
use url::Url;

use crate::config::{GiftshopConfig, bearer_value};
use crate::error::ApiError;

use envelope::{ApiEnvelope, error_message, truncate};

/// Body of the add and update cart calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartItemRequest {
    product_id: ProductId,
    quantity: u32,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the gift shop REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GiftshopConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                token: config.api_token.clone(),
            }),
        })
    }

    /// Base URL every endpoint path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = &self.inner.token {
            builder = builder.header(reqwest::header::AUTHORIZATION, bearer_value(token));
        }
        Ok(builder)
    }

    /// Send a request and unwrap the envelope, returning its `data`.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> Result<Option<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(endpoint, status = %status, "Backend refused credentials");
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                endpoint,
                status = %status,
                body = %truncate(&body, 500),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                endpoint,
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })?;

        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        Ok(envelope.data)
    }

    /// Send a request whose response data is irrelevant.
    async fn send_ignoring_data(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> Result<(), ApiError> {
        self.send::<IgnoredAny>(builder, endpoint).await.map(|_| ())
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the caller's server-side cart. Missing data means an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the caller is not authenticated,
    /// or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Vec<CartLineItem>, ApiError> {
        let builder = self.request(Method::GET, "online/cart")?;
        let lines = self
            .send::<Vec<CartLineItem>>(builder, "online/cart")
            .await?
            .unwrap_or_default();
        debug!(lines = lines.len(), "Fetched cart");
        Ok(lines)
    }

    /// Add `quantity` of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "online/cart/add")?
            .json(&CartItemRequest {
                product_id,
                quantity,
            });
        self.send_ignoring_data(builder, "online/cart/add").await
    }

    /// Remove a product's line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<(), ApiError> {
        let path = format!("online/cart/remove/{product_id}");
        let builder = self.request(Method::DELETE, &path)?;
        self.send_ignoring_data(builder, &path).await
    }

    /// Set a product's quantity in the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn update_cart_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, "online/cart/update")?
            .json(&CartItemRequest {
                product_id,
                quantity,
            });
        self.send_ignoring_data(builder, "online/cart/update").await
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, "online/cart/clear")?;
        self.send_ignoring_data(builder, "online/cart/clear").await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an online order for the given lines.
    ///
    /// The backend reprices the lines, reserves stock and records payment in
    /// one step. It does not empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses the order
    /// (for example on insufficient stock).
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn place_order(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, ApiError> {
        let builder = self.request(Method::POST, "online/checkout")?.json(request);
        self.send::<CheckoutResponse>(builder, "online/checkout")
            .await?
            .ok_or_else(|| ApiError::MissingData("online/checkout".to_string()))
    }

    // =========================================================================
    // Settings Methods
    // =========================================================================

    /// Read the store tax rate.
    ///
    /// A missing or non-numeric `taxRate` is reported as zero; only transport
    /// and status failures are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_tax_rate(&self) -> Result<TaxRate, ApiError> {
        let builder = self.request(Method::GET, "settings/tax")?;
        let data = self
            .send::<serde_json::Value>(builder, "settings/tax")
            .await?;
        let rate = TaxRate::lenient(data.as_ref().and_then(|d| d.get("taxRate")));
        debug!(rate = %rate.as_decimal(), "Fetched tax rate");
        Ok(rate)
    }

    // =========================================================================
    // Cashier Methods
    // =========================================================================

    /// Look up a product by its barcode for the register.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingData` if the backend has no such product.
    #[instrument(skip(self))]
    pub async fn lookup_barcode(&self, barcode: &str) -> Result<CashierProduct, ApiError> {
        let path = format!(
            "cashier/products/barcode/{}",
            urlencoding::encode(barcode.trim())
        );
        let builder = self.request(Method::GET, &path)?;
        self.send::<CashierProduct>(builder, &path)
            .await?
            .ok_or(ApiError::MissingData(path))
    }

    /// Record a completed register sale.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the sale.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn submit_transaction(
        &self,
        request: &PosTransactionRequest,
    ) -> Result<PosTransactionResponse, ApiError> {
        let builder = self
            .request(Method::POST, "cashier/transactions")?
            .json(request);
        self.send::<PosTransactionResponse>(builder, "cashier/transactions")
            .await?
            .ok_or_else(|| ApiError::MissingData("cashier/transactions".to_string()))
    }
}
