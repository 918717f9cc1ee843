//! Register commands.

use giftshop_core::{CustomerId, PaymentMethod, format_lkr};
use giftshop_storefront::{ApiClient, GiftshopConfig, Register, TaxRateCache};

use super::CommandError;

/// Scan every barcode into a fresh register and complete the sale.
///
/// # Errors
///
/// Stops at the first barcode that cannot be resolved or is out of stock,
/// or returns the submission error. Nothing is recorded in either case.
#[allow(clippy::print_stdout)]
pub async fn sell(
    config: &GiftshopConfig,
    barcodes: &[String],
    payment_method: PaymentMethod,
    customer_id: Option<CustomerId>,
    notes: Option<String>,
) -> Result<(), CommandError> {
    let client = ApiClient::new(config)?;
    let tax = TaxRateCache::new(client.clone(), config.tax_cache_ttl);
    let mut register = Register::new(client);

    for barcode in barcodes {
        let quantity = register.scan(barcode).await?;
        tracing::debug!(barcode = %barcode, quantity, "Scanned");
    }

    let rate = tax.current().await;
    let totals = register.totals(Some(rate));
    println!("Subtotal {:>16}", format_lkr(totals.subtotal));
    println!("Tax ({rate}) {:>12}", format_lkr(totals.tax));
    println!("Total {:>19}", format_lkr(totals.total));

    let receipt = register
        .complete_sale(Some(rate), payment_method, customer_id, notes)
        .await?;

    println!();
    println!("Bill {} ({})", receipt.bill_number, receipt.payment_method);
    if let Some(date) = receipt.transaction_date {
        println!("{}", date.format("%Y-%m-%d %H:%M"));
    }
    for line in &receipt.items {
        println!(
            "  {:<32} {:>4} x {:>14}  {:>14}",
            line.product_name,
            line.quantity,
            format_lkr(line.unit_price),
            format_lkr(line.line_total),
        );
    }
    println!("Paid {:>20}", format_lkr(receipt.net_amount));
    Ok(())
}
