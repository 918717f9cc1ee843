//! The cart synchronizer store.

use std::future::Future;
use std::sync::Arc;

use giftshop_core::{Cart, CartLineItem, Product, ProductId, TaxRate, Totals};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::CartBackend;
use crate::error::{ApiError, CartError, add_breadcrumb};

/// How the local cart relates to the server cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
    /// Never loaded from the server (new session or guest).
    #[default]
    Unsynced,
    /// The last operation left the cart exactly as the server reported it.
    Reconciled,
    /// The last operation could not reach the server and patched the local
    /// copy instead; the two may differ.
    Degraded,
}

#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    sync: SyncState,
}

/// Session-scoped cart store.
///
/// Cheap to clone; clones share the same cart. Create one per session and
/// drop it at logout.
///
/// Mutations are not serialized. Each completion replaces the whole cart, so
/// when two calls overlap the last response to land wins. The state lock is
/// never held across a backend call.
pub struct CartSynchronizer<B> {
    inner: Arc<CartSynchronizerInner<B>>,
}

struct CartSynchronizerInner<B> {
    backend: B,
    state: RwLock<CartState>,
}

impl<B> Clone for CartSynchronizer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: CartBackend> CartSynchronizer<B> {
    /// Create an empty, unsynced cart over `backend`.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(CartSynchronizerInner {
                backend,
                state: RwLock::new(CartState::default()),
            }),
        }
    }

    /// The backend this cart talks to.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Load the server cart.
    ///
    /// Failure (guest session, network down) leaves the cart empty and is not
    /// reported.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        match self.inner.backend.fetch_cart().await {
            Ok(lines) => self.replace(lines).await,
            Err(e) => debug!(error = %e, "Server cart unavailable, starting empty"),
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` when `quantity` is zero (nothing is changed).
    /// `NotPersisted` when the server call failed: the item has still been
    /// added locally, and the caller should tell the user it was not saved.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_item(&self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let backend = &self.inner.backend;
        match self
            .mutate_then_fetch(backend.add_item(product.product_id, quantity))
            .await
        {
            Ok(lines) => {
                self.replace(lines).await;
                Ok(())
            }
            Err(e) => {
                self.degrade("add", Some(product.product_id), &e, |cart| {
                    cart.add_product(product, quantity);
                })
                .await;
                Err(CartError::NotPersisted(e))
            }
        }
    }

    /// Remove a product's line. Always appears to succeed.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) {
        let backend = &self.inner.backend;
        match self
            .mutate_then_fetch(backend.remove_item(product_id))
            .await
        {
            Ok(lines) => self.replace(lines).await,
            Err(e) => {
                self.degrade("remove", Some(product_id), &e, |cart| {
                    cart.remove(product_id);
                })
                .await;
            }
        }
    }

    /// Set a line's quantity; zero removes the line. Always appears to
    /// succeed.
    ///
    /// No stock check happens here: see [`Self::change_quantity`].
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id).await;
            return;
        }

        let backend = &self.inner.backend;
        match self
            .mutate_then_fetch(backend.update_quantity(product_id, quantity))
            .await
        {
            Ok(lines) => self.replace(lines).await,
            Err(e) => {
                self.degrade("update", Some(product_id), &e, |cart| {
                    cart.set_quantity(product_id, quantity);
                })
                .await;
            }
        }
    }

    /// Quantity change as issued by the cart view: checks the line's cached
    /// stock before touching the server.
    ///
    /// # Errors
    ///
    /// `NotInCart` if the product has no line, `ExceedsStock` if `requested`
    /// is above the cached stock. Neither makes a backend call.
    pub async fn change_quantity(
        &self,
        product_id: ProductId,
        requested: u32,
    ) -> Result<(), CartError> {
        if requested == 0 {
            self.remove_item(product_id).await;
            return Ok(());
        }

        let line = self
            .line(product_id)
            .await
            .ok_or(CartError::NotInCart(product_id))?;

        if !line.has_stock_for(requested) {
            return Err(CartError::ExceedsStock {
                product_name: line.product_name,
                available: line.current_stock,
            });
        }

        self.update_quantity(product_id, requested).await;
        Ok(())
    }

    /// Empty the cart. The local cart is emptied even if the server call
    /// fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        match self.inner.backend.clear().await {
            Ok(()) => {
                let mut state = self.inner.state.write().await;
                state.cart.clear();
                state.sync = SyncState::Reconciled;
            }
            Err(e) => {
                self.degrade("clear", None, &e, Cart::clear).await;
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the current cart.
    pub async fn cart(&self) -> Cart {
        self.inner.state.read().await.cart.clone()
    }

    /// The line for `product_id`, if the cart holds one.
    pub async fn line(&self, product_id: ProductId) -> Option<CartLineItem> {
        self.inner.state.read().await.cart.get(product_id).cloned()
    }

    /// Total units across all lines, for the cart badge.
    pub async fn item_count(&self) -> u64 {
        self.inner.state.read().await.cart.item_count()
    }

    /// Sum of `online_price × quantity`.
    pub async fn subtotal(&self) -> Decimal {
        self.inner.state.read().await.cart.subtotal()
    }

    /// Subtotal, tax and total at `tax_rate`.
    pub async fn totals(&self, tax_rate: Option<TaxRate>) -> Totals {
        self.inner.state.read().await.cart.totals(tax_rate)
    }

    /// How the cart relates to the server after the last operation.
    pub async fn sync_state(&self) -> SyncState {
        self.inner.state.read().await.sync
    }

    /// Whether the local cart is known to possibly differ from the server.
    pub async fn is_stale(&self) -> bool {
        self.sync_state().await == SyncState::Degraded
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run a mutation and, if it succeeds, fetch the resulting server cart.
    async fn mutate_then_fetch(
        &self,
        mutation: impl Future<Output = Result<(), ApiError>>,
    ) -> Result<Vec<CartLineItem>, ApiError> {
        mutation.await?;
        self.inner.backend.fetch_cart().await
    }

    async fn replace(&self, lines: Vec<CartLineItem>) {
        let cart = Cart::from_lines(lines);
        let mut state = self.inner.state.write().await;
        debug!(lines = cart.len(), "Cart reconciled with server");
        state.cart = cart;
        state.sync = SyncState::Reconciled;
    }

    async fn degrade(
        &self,
        operation: &'static str,
        product_id: Option<ProductId>,
        error: &ApiError,
        patch: impl FnOnce(&mut Cart),
    ) {
        {
            let mut state = self.inner.state.write().await;
            patch(&mut state.cart);
            state.sync = SyncState::Degraded;
        }

        let product = product_id.map(|id| id.to_string()).unwrap_or_default();
        warn!(
            operation,
            product_id = %product,
            error = %error,
            "Cart server call failed, applied change locally"
        );
        let error = error.to_string();
        add_breadcrumb(
            "cart",
            &format!("{operation} applied locally"),
            Some(&[("product_id", product.as_str()), ("error", error.as_str())]),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::testing::{FakeBackend, product};

    fn rate(mantissa: i64, scale: u32) -> Option<TaxRate> {
        Some(TaxRate::new(Decimal::new(mantissa, scale)).unwrap())
    }

    async fn online_with(lines: &[(i64, i64, u32, u32)]) -> CartSynchronizer<FakeBackend> {
        let catalog = lines
            .iter()
            .map(|&(id, price, _, stock)| product(id, price, stock))
            .collect();
        let sync = CartSynchronizer::new(FakeBackend::online(catalog));
        for &(id, price, qty, stock) in lines {
            sync.add_item(&product(id, price, stock), qty).await.unwrap();
        }
        sync
    }

    #[tokio::test]
    async fn test_initialize_loads_server_cart() {
        let backend = FakeBackend::online(vec![product(1, 250, 10)]);
        backend.add_item(ProductId::new(1), 2).await.unwrap();

        let sync = CartSynchronizer::new(backend);
        assert_eq!(sync.sync_state().await, SyncState::Unsynced);

        sync.initialize().await;
        assert_eq!(sync.item_count().await, 2);
        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
    }

    #[tokio::test]
    async fn test_initialize_accepts_null_fields() {
        let backend = FakeBackend::online(vec![product(2, 500, 4)]);
        backend.set_server_json(serde_json::json!([
            {
                "productId": 1,
                "productName": "Palmyrah Basket",
                "onlinePrice": 750.00,
                "imageUrl": null,
                "categoryName": null,
                "quantity": 2,
                "currentStock": null
            },
            {
                "productId": 2,
                "productName": "Product 2",
                "onlinePrice": 500,
                "quantity": 1,
                "currentStock": 4
            }
        ]));

        let sync = CartSynchronizer::new(backend);
        sync.initialize().await;

        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
        assert_eq!(sync.cart().await.len(), 2);
        let line = sync.line(ProductId::new(1)).await.unwrap();
        assert_eq!(line.current_stock, 0);
        assert_eq!(line.quantity, 2);
        assert_eq!(sync.subtotal().await, Decimal::new(2000, 0));

        // No inventory means the cached stock refuses any increase
        let err = sync.change_quantity(ProductId::new(1), 3).await.unwrap_err();
        assert!(matches!(err, CartError::ExceedsStock { available: 0, .. }));

        sync.update_quantity(ProductId::new(2), 3).await;
        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
        assert_eq!(sync.item_count().await, 5);
    }

    #[tokio::test]
    async fn test_initialize_guest_starts_empty() {
        let sync = CartSynchronizer::new(FakeBackend::offline());
        sync.initialize().await;

        assert!(sync.cart().await.is_empty());
        assert_eq!(sync.sync_state().await, SyncState::Unsynced);
        assert!(!sync.is_stale().await);
    }

    #[tokio::test]
    async fn test_add_offline_merges_locally_and_reports() {
        let sync = CartSynchronizer::new(FakeBackend::offline());
        let item = product(7, 100, 10);

        let err = sync.add_item(&item, 1).await.unwrap_err();
        assert!(matches!(err, CartError::NotPersisted(ApiError::Unauthorized { .. })));
        assert_eq!(sync.cart().await.len(), 1);
        assert_eq!(sync.line(ProductId::new(7)).await.unwrap().quantity, 1);

        assert!(sync.add_item(&item, 2).await.is_err());
        let cart = sync.cart().await;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(7)).unwrap().quantity, 3);
        assert!(sync.is_stale().await);
    }

    #[tokio::test]
    async fn test_add_online_takes_server_values() {
        let backend = FakeBackend::online(vec![product(1, 90, 10)]);
        let sync = CartSynchronizer::new(backend);

        // Caller's product record carries a stale price
        sync.add_item(&product(1, 100, 10), 2).await.unwrap();

        let line = sync.line(ProductId::new(1)).await.unwrap();
        assert_eq!(line.online_price, Decimal::new(90, 0));
        assert_eq!(line.quantity, 2);
        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
        assert_eq!(sync.backend().calls(), vec!["add", "fetch"]);
    }

    #[tokio::test]
    async fn test_add_zero_quantity_is_rejected_without_calls() {
        let sync = CartSynchronizer::new(FakeBackend::online(vec![product(1, 10, 5)]));

        let err = sync.add_item(&product(1, 10, 5), 0).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
        assert!(sync.cart().await.is_empty());
        assert!(sync.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_with_failed_refresh_falls_back() {
        let sync = CartSynchronizer::new(FakeBackend::online(vec![product(1, 10, 5)]));
        sync.backend().set_fail_fetch(true);

        let err = sync.add_item(&product(1, 10, 5), 1).await.unwrap_err();
        assert!(matches!(err, CartError::NotPersisted(ApiError::Status { status: 500, .. })));
        assert_eq!(sync.item_count().await, 1);
        assert!(sync.is_stale().await);
        // The server did record the add
        assert_eq!(sync.backend().server_lines().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejected_by_server_falls_back() {
        let sync = CartSynchronizer::new(FakeBackend::online(Vec::new()));

        let err = sync.add_item(&product(5, 10, 5), 1).await.unwrap_err();
        assert!(matches!(err, CartError::NotPersisted(ApiError::Rejected(_))));
        assert!(sync.cart().await.contains(ProductId::new(5)));
    }

    #[tokio::test]
    async fn test_remove_offline_never_errors() {
        let sync = online_with(&[(1, 10, 1, 5), (2, 20, 1, 5)]).await;
        sync.backend().set_online(false);

        sync.remove_item(ProductId::new(1)).await;

        let cart = sync.cart().await;
        assert!(!cart.contains(ProductId::new(1)));
        assert!(cart.contains(ProductId::new(2)));
        assert!(sync.is_stale().await);
    }

    #[tokio::test]
    async fn test_remove_online_reconciles() {
        let sync = online_with(&[(1, 10, 1, 5), (2, 20, 1, 5)]).await;

        sync.remove_item(ProductId::new(2)).await;

        assert_eq!(sync.cart().await.len(), 1);
        assert_eq!(sync.backend().server_lines().len(), 1);
        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_either_way() {
        let sync = online_with(&[(1, 10, 2, 5), (2, 20, 1, 5)]).await;
        sync.update_quantity(ProductId::new(1), 0).await;
        assert!(!sync.cart().await.contains(ProductId::new(1)));
        assert!(sync.backend().calls().contains(&"remove"));

        sync.backend().set_online(false);
        sync.update_quantity(ProductId::new(2), 0).await;
        assert!(sync.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_offline_sets_quantity_without_clamp() {
        let sync = online_with(&[(1, 10, 1, 3)]).await;
        sync.backend().set_online(false);

        sync.update_quantity(ProductId::new(1), 9).await;

        assert_eq!(sync.line(ProductId::new(1)).await.unwrap().quantity, 9);
        assert!(sync.is_stale().await);
    }

    #[tokio::test]
    async fn test_update_online_reconciles_price_change() {
        let sync = online_with(&[(1, 10, 1, 5)]).await;
        sync.backend().set_price(ProductId::new(1), Decimal::new(12, 0));

        sync.update_quantity(ProductId::new(1), 2).await;

        assert_eq!(sync.subtotal().await, Decimal::new(24, 0));
        assert!(!sync.is_stale().await);
    }

    #[tokio::test]
    async fn test_change_quantity_checks_cached_stock() {
        let sync = online_with(&[(1, 10, 1, 3)]).await;
        let calls_before = sync.backend().calls().len();

        let err = sync.change_quantity(ProductId::new(1), 4).await.unwrap_err();
        assert!(matches!(err, CartError::ExceedsStock { available: 3, .. }));
        assert_eq!(sync.backend().calls().len(), calls_before);
        assert_eq!(sync.item_count().await, 1);

        sync.change_quantity(ProductId::new(1), 3).await.unwrap();
        assert_eq!(sync.item_count().await, 3);

        let err = sync.change_quantity(ProductId::new(9), 1).await.unwrap_err();
        assert!(matches!(err, CartError::NotInCart(_)));

        sync.change_quantity(ProductId::new(1), 0).await.unwrap();
        assert!(sync.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_always_empties() {
        let sync = online_with(&[(1, 10, 2, 5)]).await;
        sync.backend().set_online(false);

        sync.clear().await;
        assert_eq!(sync.item_count().await, 0);
        assert!(sync.is_stale().await);
        // Server still holds the line
        assert_eq!(sync.backend().server_lines().len(), 1);

        sync.backend().set_online(true);
        sync.clear().await;
        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
        assert!(sync.backend().server_lines().is_empty());
    }

    #[tokio::test]
    async fn test_totals_end_to_end() {
        let sync = online_with(&[(1, 250, 2, 10), (2, 1000, 1, 10)]).await;

        assert_eq!(sync.item_count().await, 3);
        assert_eq!(sync.subtotal().await, Decimal::new(1500, 0));

        let totals = sync.totals(rate(5, 2)).await;
        assert_eq!(totals.subtotal, Decimal::new(1500, 0));
        assert_eq!(totals.tax, Decimal::new(75, 0));
        assert_eq!(totals.total, Decimal::new(1575, 0));
        assert_eq!(sync.totals(None).await, sync.totals(Some(TaxRate::ZERO)).await);
    }

    #[tokio::test]
    async fn test_recovers_after_degraded() {
        let sync = CartSynchronizer::new(FakeBackend::online(vec![product(1, 10, 5)]));
        sync.backend().set_online(false);
        let _ = sync.add_item(&product(1, 10, 5), 1).await;
        assert!(sync.is_stale().await);

        sync.backend().set_online(true);
        sync.add_item(&product(1, 10, 5), 1).await.unwrap();

        // Server only saw the second add
        assert_eq!(sync.item_count().await, 1);
        assert_eq!(sync.sync_state().await, SyncState::Reconciled);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let sync = CartSynchronizer::new(FakeBackend::offline());
        let view = sync.clone();

        let _ = sync.add_item(&product(3, 10, 5), 1).await;
        assert_eq!(view.item_count().await, 1);
    }
}
