//! Status enums for orders and payment charges.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

/// Status of a charge intent as reported by the payment gateway.
///
/// Mirrors the payment intent lifecycle of the card processor; anything the
/// gateway reports that is not listed here deserializes as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    #[default]
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl ChargeStatus {
    /// Whether the customer's funds have been captured.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_status_from_gateway_string() {
        let status: ChargeStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(status, ChargeStatus::Succeeded);
        assert!(status.is_paid());

        let status: ChargeStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, ChargeStatus::Unknown);
        assert!(!status.is_paid());
    }
}
