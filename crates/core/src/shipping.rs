//! Fixed shipping tiers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// A named shipping tier with a flat price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    pub const ALL: [Self; 3] = [Self::Standard, Self::Express, Self::Overnight];

    /// Flat price of the tier.
    #[must_use]
    pub const fn price(self) -> Decimal {
        match self {
            Self::Standard => Decimal::from_parts(599, 0, 0, false, 2),
            Self::Express => Decimal::from_parts(1599, 0, 0, false, 2),
            Self::Overnight => Decimal::from_parts(2999, 0, 0, false, 2),
        }
    }

    /// Identifier used by clients and stored on orders.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
        }
    }

    /// Human-readable label for receipts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard (5-7 business days)",
            Self::Express => "Express (2-3 business days)",
            Self::Overnight => "Overnight (next business day)",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ShippingMethod {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| PricingError::UnknownShippingMethod(s.to_owned()))
    }
}
