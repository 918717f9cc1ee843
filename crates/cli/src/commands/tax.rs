//! Store tax rate.

use giftshop_storefront::{ApiClient, GiftshopConfig};

use super::CommandError;

/// Print the current store tax rate.
///
/// Unlike checkout, a failed fetch is reported rather than shown as zero.
///
/// # Errors
///
/// Returns error if the settings endpoint cannot be read.
#[allow(clippy::print_stdout)]
pub async fn show(config: &GiftshopConfig) -> Result<(), CommandError> {
    let client = ApiClient::new(config)?;
    let rate = client.get_tax_rate().await?;
    println!("Tax rate: {rate} ({})", rate.as_decimal());
    Ok(())
}
