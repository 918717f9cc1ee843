//! Rupee amount display.
//!
//! Amounts are carried at full precision everywhere. Rounding to two places
//! happens only when an amount is rendered for display; the rendered string is
//! never parsed back into arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount in Sri Lankan rupees, e.g. `LKR 1,575.00`.
#[must_use]
pub fn format_lkr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    format!("LKR {sign}{}.{fraction}", group_thousands(whole))
}

/// Insert `,` between every group of three integer digits.
fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
