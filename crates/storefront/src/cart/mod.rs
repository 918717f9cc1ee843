//! Shopping cart synchronization.
//!
//! # Architecture
//!
//! - The backend cart is the source of truth whenever it is reachable
//! - Every successful mutation is followed by a full re-fetch that replaces
//!   local state, absorbing server-side price, stock and merge corrections
//! - When a call fails the synchronizer patches its local copy instead and
//!   marks itself [`SyncState::Degraded`]
//!
//! The synchronizer reaches the backend only through [`CartBackend`], which
//! [`ApiClient`] implements over HTTP.

mod sync;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;

use giftshop_core::{CartLineItem, ProductId};

use crate::api::ApiClient;
use crate::error::ApiError;

pub use sync::{CartSynchronizer, SyncState};

/// Remote cart operations the synchronizer depends on.
pub trait CartBackend: Send + Sync + 'static {
    /// Fetch the server cart.
    fn fetch_cart(&self) -> impl Future<Output = Result<Vec<CartLineItem>, ApiError>> + Send;

    /// Add `quantity` of a product; the server merges with an existing line.
    fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Remove a product's line.
    fn remove_item(&self, product_id: ProductId)
    -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set a product's quantity.
    fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Remove every line.
    fn clear(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl CartBackend for ApiClient {
    async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, ApiError> {
        self.get_cart().await
    }

    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.add_to_cart(product_id, quantity).await
    }

    async fn remove_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.remove_from_cart(product_id).await
    }

    async fn update_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.update_cart_quantity(product_id, quantity).await
    }

    async fn clear(&self) -> Result<(), ApiError> {
        self.clear_cart().await
    }
}
