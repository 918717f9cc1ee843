//! Error types with Sentry breadcrumb helpers.
//!
//! `ApiError` covers everything that can go wrong talking to the backend.
//! `CartError` is what cart callers see; most cart operations never return
//! one because they degrade to a local edit instead.

use giftshop_core::ProductId;
use thiserror::Error;

/// Errors from the backend REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller is not logged in or lacks permission (401/403).
    #[error("Unauthorized: HTTP {status}")]
    Unauthorized { status: u16 },

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// API answered with `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Envelope had no `data` where one is required.
    #[error("No data in response from {0}")]
    MissingData(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the failure is an authentication/authorization problem.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Errors surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least one.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// The change was applied locally but the server did not record it.
    #[error("Cart updated locally but not saved: {0}")]
    NotPersisted(#[source] ApiError),

    /// Product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Requested quantity is above the cached stock snapshot.
    #[error("Sorry, only {available} units available in stock for {product_name}")]
    ExceedsStock {
        product_name: String,
        available: u32,
    },
}

/// Add a breadcrumb for cart and register actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Remove degraded to local", Some(&[("product_id", "7")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Warning,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ApiError::Unauthorized { status: 401 };
        assert_eq!(err.to_string(), "Unauthorized: HTTP 401");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_cart_error_display() {
        let err = CartError::ExceedsStock {
            product_name: "Brass Elephant".to_string(),
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Sorry, only 3 units available in stock for Brass Elephant"
        );

        let err = CartError::NotPersisted(ApiError::Rejected("out of stock".to_string()));
        assert_eq!(
            err.to_string(),
            "Cart updated locally but not saved: Request rejected: out of stock"
        );
    }

    #[test]
    fn test_add_breadcrumb_without_client() {
        // No Sentry client bound: must be a no-op rather than a panic
        add_breadcrumb("cart", "test", Some(&[("product_id", "1")]));
    }
}
