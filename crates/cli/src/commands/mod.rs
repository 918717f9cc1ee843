//! CLI command implementations.

pub mod cart;
pub mod pos;
pub mod tax;

use giftshop_storefront::config::ConfigError;
use giftshop_storefront::{ApiError, CartError, CheckoutError, RegisterError};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Register(#[from] RegisterError),
}
