//! Store settings, currently just the tax rate.
//!
//! The rate is cached with `moka` for the configured TTL (5 minutes by
//! default) so rendering the cart or checkout does not hit the backend on
//! every view. A failed fetch falls back to zero tax and is not cached, so
//! the next read tries again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use giftshop_core::TaxRate;
use moka::future::Cache;
use tracing::{debug, instrument, warn};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Where the tax rate comes from.
pub trait SettingsBackend: Send + Sync + 'static {
    fn fetch_tax_rate(&self) -> impl Future<Output = Result<TaxRate, ApiError>> + Send;
}

impl SettingsBackend for ApiClient {
    async fn fetch_tax_rate(&self) -> Result<TaxRate, ApiError> {
        self.get_tax_rate().await
    }
}

/// Cached store tax rate.
pub struct TaxRateCache<S> {
    inner: Arc<TaxRateCacheInner<S>>,
}

struct TaxRateCacheInner<S> {
    backend: S,
    cache: Cache<(), TaxRate>,
}

impl<S> Clone for TaxRateCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SettingsBackend> TaxRateCache<S> {
    #[must_use]
    pub fn new(backend: S, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();

        Self {
            inner: Arc::new(TaxRateCacheInner { backend, cache }),
        }
    }

    /// The current rate. Never fails: an unreachable backend yields
    /// [`TaxRate::ZERO`].
    #[instrument(skip(self))]
    pub async fn current(&self) -> TaxRate {
        if let Some(rate) = self.inner.cache.get(&()).await {
            debug!("Cache hit for tax rate");
            return rate;
        }

        match self.inner.backend.fetch_tax_rate().await {
            Ok(rate) => {
                self.inner.cache.insert((), rate).await;
                rate
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch tax rate, using zero");
                TaxRate::ZERO
            }
        }
    }

    /// Drop the cached rate so the next read refetches it.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(&()).await;
    }
}
