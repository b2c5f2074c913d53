//! Cart aggregation and the pre-checkout gate.
//!
//! `subtotal` is the exact sum of line totals; `tax` is the flat rate on the
//! subtotal rounded to cents; `total = subtotal + shipping + tax`. Nothing
//! else is rounded until [`CartAggregationResult::rounded`] or
//! [`CartAggregationResult::charge_amount`] is called.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::error::PricingError;
use crate::shipping::ShippingMethod;
use crate::types::{CurrencyCode, LineId, Price, round2};

/// Flat sales tax rate applied to the subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Totals derived from a cart and a shipping tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAggregationResult {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub shipping_method: ShippingMethod,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartAggregationResult {
    /// Copy with every amount rounded to cents, for display.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round2(self.subtotal),
            shipping: round2(self.shipping),
            shipping_method: self.shipping_method,
            tax: round2(self.tax),
            total: round2(self.total),
        }
    }

    /// The amount to charge, rounded once.
    #[must_use]
    pub fn charge_amount(&self, currency: CurrencyCode) -> Price {
        Price::new(round2(self.total), currency)
    }
}

/// Sum `lines` and apply the shipping tier identified by `shipping_method_id`.
///
/// # Errors
///
/// Returns [`PricingError::UnknownShippingMethod`] if the ID is not a known
/// tier.
pub fn aggregate(
    lines: &[CartLine],
    shipping_method_id: &str,
) -> Result<CartAggregationResult, PricingError> {
    let method: ShippingMethod = shipping_method_id.parse()?;
    Ok(aggregate_with(lines, method))
}

/// [`aggregate`] for an already-parsed shipping tier.
#[must_use]
pub fn aggregate_with(lines: &[CartLine], method: ShippingMethod) -> CartAggregationResult {
    let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
    let shipping = method.price();
    let tax = round2(subtotal * TAX_RATE);
    CartAggregationResult {
        subtotal,
        shipping,
        shipping_method: method,
        tax,
        total: subtotal + shipping + tax,
    }
}

/// Outcome of the pre-checkout gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutGate {
    Ready,
    Blocked {
        #[serde(rename = "incompleteLineIds")]
        incomplete_line_ids: Vec<LineId>,
    },
}

impl CheckoutGate {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Turn a blocked gate into an error.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::IncompleteCartLine`] listing the blocking lines.
    pub fn require_ready(self) -> Result<(), PricingError> {
        match self {
            Self::Ready => Ok(()),
            Self::Blocked {
                incomplete_line_ids,
            } => Err(PricingError::IncompleteCartLine {
                line_ids: incomplete_line_ids,
            }),
        }
    }
}

/// Check that every sized line has a ring size.
#[must_use]
pub fn validate_for_checkout(lines: &[CartLine]) -> CheckoutGate {
    let incomplete_line_ids: Vec<LineId> = lines
        .iter()
        .filter(|l| l.is_incomplete())
        .map(|l| l.id.clone())
        .collect();
    if incomplete_line_ids.is_empty() {
        CheckoutGate::Ready
    } else {
        CheckoutGate::Blocked {
            incomplete_line_ids,
        }
    }
}
