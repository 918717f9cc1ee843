//! Payment and status enums for register sales and online orders.

use serde::{Deserialize, Serialize};

/// How a sale or online order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    CreditCard,
    DebitCard,
    /// Online orders only.
    CashOnDelivery,
}

impl PaymentMethod {
    /// Wire representation expected by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::CreditCard => "CREDIT_CARD",
            Self::DebitCard => "DEBIT_CARD",
            Self::CashOnDelivery => "CASH_ON_DELIVERY",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown payment method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "CASH" => Ok(Self::Cash),
            "CREDIT_CARD" | "CREDIT" => Ok(Self::CreditCard),
            "DEBIT_CARD" | "DEBIT" => Ok(Self::DebitCard),
            "CASH_ON_DELIVERY" | "COD" => Ok(Self::CashOnDelivery),
            _ => Err(UnknownPaymentMethod(s.to_string())),
        }
    }
}

/// Register transaction status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
    Pending,
    Cancelled,
    Refunded,
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"CREDIT_CARD\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"DEBIT_CARD\"").unwrap();
        assert_eq!(parsed, PaymentMethod::DebitCard);
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(
            "credit-card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!("debit".parse::<PaymentMethod>().unwrap(), PaymentMethod::DebitCard);
        assert_eq!(
            "cod".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_transaction_status_tolerates_unknown() {
        let status: TransactionStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TransactionStatus::Completed);
        let status: TransactionStatus = serde_json::from_str("\"voided\"").unwrap();
        assert_eq!(status, TransactionStatus::Unknown);
    }
}
