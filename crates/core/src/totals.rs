//! Checkout total calculator.
//!
//! The cart page, the checkout page and the register screen all derive their
//! subtotal, tax and grand total through [`compute_totals`], so the three can
//! never disagree on arithmetic. Results are full precision; rounding belongs
//! to display formatting only.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::tax::TaxRate;

/// A line that contributes `unit_price × quantity` to a subtotal.
pub trait PricedLine {
    /// Price of a single unit.
    fn unit_price(&self) -> Decimal;

    /// Number of units on the line.
    fn quantity(&self) -> u32;

    /// `unit_price × quantity`.
    fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity())
    }
}

/// Derived checkout amounts. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Compute subtotal, tax and total for a set of lines.
///
/// A missing tax rate is treated as zero.
#[must_use]
pub fn compute_totals<L: PricedLine>(lines: &[L], tax_rate: Option<TaxRate>) -> Totals {
    let subtotal = subtotal(lines);
    let tax = subtotal * tax_rate.unwrap_or(TaxRate::ZERO).as_decimal();

    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Sum of `unit_price × quantity` over all lines.
#[must_use]
pub fn subtotal<L: PricedLine>(lines: &[L]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}
