//! Gift shop core - shared cart, pricing and tax types.
//!
//! This crate provides the pure domain layer used by every gift shop client
//! component:
//! - `storefront` - Cart synchronization, checkout and register client
//! - `cli` - Command-line driver for cart, tax and point-of-sale flows
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no global state. Every total shown on the cart, checkout and
//! point-of-sale screens is computed here so the three never disagree.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money formatting and payment methods
//! - [`cart`] - Online cart line items and the keyed cart collection
//! - [`tax`] - Tax-rate fraction with strict and lenient construction
//! - [`totals`] - Checkout total calculator
//! - [`order`] - Online order placement payloads
//! - [`pos`] - Point-of-sale register cart and transaction payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod pos;
pub mod tax;
pub mod totals;
pub mod types;

pub use cart::{Cart, CartLineItem, Product};
pub use order::{CheckoutRequest, CheckoutResponse, OrderError, ShippingAddress};
pub use tax::{TaxRate, TaxRateError};
pub use totals::{PricedLine, Totals, compute_totals};
pub use types::*;
