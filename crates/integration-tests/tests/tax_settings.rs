//! Tax endpoint parsing and caching.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use giftshop_core::TaxRate;
use giftshop_integration_tests::{BackendState, FakeBackend};
use giftshop_storefront::{ApiError, TaxRateCache};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn backend_with_rate(rate: Value) -> FakeBackend {
    FakeBackend::start(BackendState {
        tax_rate: rate,
        ..BackendState::default()
    })
    .await
}

#[tokio::test]
async fn test_numeric_rate() {
    let backend = backend_with_rate(json!(0.05)).await;
    let rate = backend.guest_client().get_tax_rate().await.unwrap();
    assert_eq!(rate.as_decimal(), Decimal::new(5, 2));
    assert_eq!(rate.to_string(), "5%");
}

#[tokio::test]
async fn test_string_rate() {
    let backend = backend_with_rate(json!("0.075")).await;
    let rate = backend.guest_client().get_tax_rate().await.unwrap();
    assert_eq!(rate.as_decimal(), Decimal::new(75, 3));
    assert_eq!(rate.percent(), 8);
}

#[tokio::test]
async fn test_unusable_rates_are_zero() {
    for value in [Value::Null, json!("n/a"), json!(-0.1), json!(3), json!({"value": 0.05})] {
        let backend = backend_with_rate(value.clone()).await;
        let rate = backend.guest_client().get_tax_rate().await.unwrap();
        assert_eq!(rate, TaxRate::ZERO, "taxRate = {value}");
    }
}

#[tokio::test]
async fn test_unavailable_settings_is_an_error() {
    let backend = backend_with_rate(json!(0.05)).await;
    backend.with_state(|s| s.fail_settings = true);

    let err = backend.guest_client().get_tax_rate().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_cache_fetches_once() {
    let backend = backend_with_rate(json!(0.05)).await;
    let cache = TaxRateCache::new(backend.guest_client(), Duration::from_secs(300));

    for _ in 0..3 {
        assert_eq!(cache.current().await.percent(), 5);
    }
    assert_eq!(backend.snapshot().tax_fetches, 1);

    backend.with_state(|s| s.tax_rate = json!(0.08));
    cache.invalidate().await;
    assert_eq!(cache.current().await.percent(), 8);
    assert_eq!(backend.snapshot().tax_fetches, 2);
}

#[tokio::test]
async fn test_cache_fails_open_and_retries() {
    let backend = backend_with_rate(json!(0.05)).await;
    backend.with_state(|s| s.fail_settings = true);
    let cache = TaxRateCache::new(backend.guest_client(), Duration::from_secs(300));

    assert_eq!(cache.current().await, TaxRate::ZERO);

    backend.with_state(|s| s.fail_settings = false);
    assert_eq!(cache.current().await.percent(), 5);
    assert_eq!(backend.snapshot().tax_fetches, 2);
}
