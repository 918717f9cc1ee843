//! Tax-rate fraction.
//!
//! The settings endpoint reports the store-wide tax rate as a fraction in
//! `[0, 1]` (`0.05` is five percent). Values read from the network go through
//! [`TaxRate::lenient`], which fails open to zero: a broken settings fetch must
//! never block checkout.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from strict tax-rate construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxRateError {
    #[error("Tax rate {0} is outside the range 0..=1")]
    OutOfRange(Decimal),
}

/// A tax rate expressed as a decimal fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// No tax.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a tax rate, rejecting values outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `TaxRateError::OutOfRange` for negative values or values above one.
    pub fn new(fraction: Decimal) -> Result<Self, TaxRateError> {
        if (fraction.is_sign_negative() && !fraction.is_zero()) || fraction > Decimal::ONE {
            return Err(TaxRateError::OutOfRange(fraction));
        }
        Ok(Self(fraction.normalize()))
    }

    /// Create a tax rate from a float, mapping NaN, infinities and
    /// out-of-range values to zero.
    #[must_use]
    pub fn from_f64_lenient(fraction: f64) -> Self {
        Decimal::from_f64(fraction)
            .and_then(|d| Self::new(d).ok())
            .unwrap_or(Self::ZERO)
    }

    /// Interpret an arbitrary JSON value as a tax rate.
    ///
    /// Numbers and numeric strings are accepted. Anything else (null, missing,
    /// non-numeric text, out-of-range values) becomes zero.
    #[must_use]
    pub fn lenient(value: Option<&serde_json::Value>) -> Self {
        let parsed = match value {
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .map(Decimal::from)
                .or_else(|| n.to_string().parse::<Decimal>().ok())
                .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<Decimal>()
                .ok()
                .or_else(|| Decimal::from_scientific(s.trim()).ok()),
            _ => None,
        };

        parsed.and_then(|d| Self::new(d).ok()).unwrap_or(Self::ZERO)
    }

    /// The fraction as a decimal.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Whole-number percentage for display next to the tax line (`0.075` -> 8).
    #[must_use]
    pub fn percent(self) -> u32 {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = TaxRateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_accepts_bounds() {
        assert_eq!(TaxRate::new(Decimal::ZERO).unwrap(), TaxRate::ZERO);
        assert!(TaxRate::new(Decimal::ONE).is_ok());
        assert!(TaxRate::new(Decimal::new(5, 2)).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            TaxRate::new(Decimal::new(-1, 2)),
            Err(TaxRateError::OutOfRange(_))
        ));
        assert!(TaxRate::new(Decimal::new(101, 2)).is_err());
    }

    #[test]
    fn test_from_f64_lenient() {
        assert_eq!(TaxRate::from_f64_lenient(f64::NAN), TaxRate::ZERO);
        assert_eq!(TaxRate::from_f64_lenient(f64::INFINITY), TaxRate::ZERO);
        assert_eq!(TaxRate::from_f64_lenient(1.5), TaxRate::ZERO);
        assert_eq!(
            TaxRate::from_f64_lenient(0.05).as_decimal(),
            Decimal::new(5, 2)
        );
    }

    #[test]
    fn test_lenient_json_values() {
        assert_eq!(
            TaxRate::lenient(Some(&json!(0.05))).as_decimal(),
            Decimal::new(5, 2)
        );
        assert_eq!(
            TaxRate::lenient(Some(&json!("0.10"))).as_decimal(),
            Decimal::new(1, 1)
        );
        assert_eq!(TaxRate::lenient(Some(&json!(0))), TaxRate::ZERO);
        assert_eq!(TaxRate::lenient(Some(&json!(null))), TaxRate::ZERO);
        assert_eq!(TaxRate::lenient(Some(&json!("abc"))), TaxRate::ZERO);
        assert_eq!(TaxRate::lenient(Some(&json!({"rate": 1}))), TaxRate::ZERO);
        assert_eq!(TaxRate::lenient(None), TaxRate::ZERO);
    }

    #[test]
    fn test_deserialize_validates_range() {
        let rate: TaxRate = serde_json::from_str("\"0.08\"").unwrap();
        assert_eq!(rate.as_decimal(), Decimal::new(8, 2));
        assert!(serde_json::from_str::<TaxRate>("\"1.5\"").is_err());
    }

    #[test]
    fn test_percent_rounds_for_display() {
        assert_eq!(TaxRate::new(Decimal::new(75, 3)).unwrap().percent(), 8);
        assert_eq!(TaxRate::new(Decimal::new(5, 2)).unwrap().percent(), 5);
        assert_eq!(TaxRate::new(Decimal::new(5, 2)).unwrap().to_string(), "5%");
    }
}
