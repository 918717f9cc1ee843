//! Gift shop storefront client library.
//!
//! Everything the cart, checkout and register screens need from the backend:
//! - [`api`] - REST client for the cart, order, settings and cashier endpoints
//! - [`cart`] - Cart synchronizer (server-authoritative, local fallback)
//! - [`settings`] - Cached store tax rate
//! - [`checkout`] - Checkout summary and online order placement
//! - [`pos`] - Register operations (barcode lookup, transaction submission)
//! - [`config`] - Environment configuration
//! - [`error`] - Error types and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod pos;
pub mod settings;

pub use api::ApiClient;
pub use cart::{CartBackend, CartSynchronizer, SyncState};
pub use checkout::{CheckoutError, CheckoutSummary, OrderBackend};
pub use config::GiftshopConfig;
pub use error::{ApiError, CartError};
pub use pos::{Register, RegisterBackend, RegisterError};
pub use settings::{SettingsBackend, TaxRateCache};
