//! Online cart commands.
//!
//! Each invocation is one short session: load the server cart, apply the
//! requested change, then print the checkout summary. `checkout` places the
//! order instead and prints the confirmation.

use giftshop_core::{PaymentMethod, PricedLine, Product, ProductId, ShippingAddress, format_lkr};
use giftshop_storefront::{
    ApiClient, CartError, CartSynchronizer, CheckoutSummary, GiftshopConfig, TaxRateCache,
};
use rust_decimal::Decimal;

use super::CommandError;

pub struct Session {
    cart: CartSynchronizer<ApiClient>,
    tax: TaxRateCache<ApiClient>,
}

impl Session {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub async fn open(config: &GiftshopConfig) -> Result<Self, CommandError> {
        let client = ApiClient::new(config)?;
        if !config.is_authenticated() {
            tracing::info!("No GIFTSHOP_API_TOKEN set, cart changes stay local");
        }

        let cart = CartSynchronizer::new(client.clone());
        cart.initialize().await;

        Ok(Self {
            cart,
            tax: TaxRateCache::new(client, config.tax_cache_ttl),
        })
    }

    /// # Errors
    ///
    /// `InvalidQuantity` for zero. A change the server did not record is
    /// reported but not treated as a failure.
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<(), CommandError> {
        match self.cart.add_item(product, quantity).await {
            Ok(()) => Ok(()),
            Err(CartError::NotPersisted(e)) => {
                tracing::warn!(error = %e, "Item added to the local cart only");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, product_id: ProductId) {
        self.cart.remove_item(product_id).await;
    }

    /// # Errors
    ///
    /// `NotInCart` or `ExceedsStock` when the change is refused locally.
    pub async fn update(&self, product_id: ProductId, quantity: u32) -> Result<(), CommandError> {
        Ok(self.cart.change_quantity(product_id, quantity).await?)
    }

    pub async fn clear(&self) {
        self.cart.clear().await;
    }

    /// Place the order and print the confirmation.
    ///
    /// # Errors
    ///
    /// An empty cart, an incomplete address, or the backend's refusal. The
    /// cart is left as it was.
    #[allow(clippy::print_stdout)]
    pub async fn checkout(
        &self,
        address: &ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<(), CommandError> {
        let order = self.cart.place_order(address, payment_method).await?;

        println!(
            "{}",
            order
                .message
                .as_deref()
                .unwrap_or("Order placed successfully")
        );
        if let Some(order_id) = order.order_id {
            println!("{:>16}  {order_id}", "Order");
        }
        println!("{:>16}  {}", "Bill", order.bill_number);
        if let Some(reference) = &order.reference_number {
            println!("{:>16}  {reference}", "Reference");
        }
        println!("{:>16}  {}", "Subtotal", format_lkr(order.total_amount));
        println!("{:>16}  {}", "Tax", format_lkr(order.tax_amount));
        println!("{:>16}  {}", "Total", format_lkr(order.net_amount));
        Ok(())
    }

    #[allow(clippy::print_stdout)]
    pub async fn show(&self) {
        let summary = CheckoutSummary::summarize(&self.cart, &self.tax).await;

        if summary.is_empty() {
            println!("Your cart is empty");
            return;
        }

        for line in &summary.lines {
            println!(
                "{:>6}  {:<32} {:>4} x {:>14}  {:>14}",
                line.product_id,
                line.product_name,
                line.quantity,
                format_lkr(line.online_price),
                format_lkr(line.line_total()),
            );
        }
        println!();
        for (label, amount) in summary.rows() {
            println!("{label:>60}  {amount:>14}");
        }
        if summary.stale {
            println!("(some changes were not saved to your account)");
        }
    }
}

/// The product record a cart add needs, built from command-line flags.
pub fn product_from_args(
    product_id: ProductId,
    name: Option<String>,
    price: Decimal,
    stock: u32,
) -> Product {
    Product {
        product_id,
        product_name: name.unwrap_or_else(|| format!("Product {product_id}")),
        description: None,
        online_price: price,
        image_url: None,
        category_name: None,
        category_id: None,
        current_stock: stock,
    }
}
