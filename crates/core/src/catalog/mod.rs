//! Product variant catalog entries.
//!
//! A [`VariantCatalogEntry`] is the pricing view of one product document: a
//! base price, a list of mutually exclusive metal options and a list of
//! independent ring size adders. The catalog store owns these documents; the
//! storefront only ever reads them.

pub mod admin;

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::ProductId;

pub use admin::{
    add_metal_option, add_size_option, remove_metal_option, remove_size_option,
    set_default_metal_option, set_size_availability,
};

/// A ring size such as `7` or `7.5`.
///
/// Stored as a decimal so sizes compare exactly and can key a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RingSize(Decimal);

impl RingSize {
    #[must_use]
    pub const fn new(size: Decimal) -> Self {
        Self(size)
    }

    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for RingSize {
    fn from(size: Decimal) -> Self {
        Self(size)
    }
}

impl fmt::Display for RingSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Storefront product categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Ring,
    MensRing,
    MensJewelry,
    Bracelet,
    Necklace,
    Earrings,
    Diamond,
    Gemstone,
}

impl ProductCategory {
    /// Whether a line of this category cannot be checked out without a size.
    #[must_use]
    pub const fn requires_size(self) -> bool {
        matches!(self, Self::Ring | Self::MensRing)
    }

    /// Loose stones that can be paired with a ring setting.
    #[must_use]
    pub const fn is_stone(self) -> bool {
        matches!(self, Self::Diamond | Self::Gemstone)
    }
}

/// A (karat, color) metal choice with its own absolute unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalOption {
    pub karat: String,
    pub color: String,
    /// Absolute unit price for this metal, not a delta from the base price.
    pub price: Decimal,
    #[serde(default)]
    pub is_default: bool,
}

impl MetalOption {
    #[must_use]
    pub fn new(karat: impl Into<String>, color: impl Into<String>, price: Decimal) -> Self {
        Self {
            karat: karat.into(),
            color: color.into(),
            price,
            is_default: false,
        }
    }

    /// Mark this option as the default metal.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Whether this option is identified by the given karat and color.
    #[must_use]
    pub fn matches(&self, karat: &str, color: &str) -> bool {
        self.karat == karat && self.color == color
    }
}

/// A ring size with availability and an incremental price adder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    pub size: RingSize,
    #[serde(default = "default_available")]
    pub is_available: bool,
    /// Added on top of the resolved metal price.
    #[serde(default)]
    pub additional_price: Decimal,
}

const fn default_available() -> bool {
    true
}

impl SizeOption {
    #[must_use]
    pub const fn new(size: RingSize, additional_price: Decimal) -> Self {
        Self {
            size,
            is_available: true,
            additional_price,
        }
    }
}

/// Pricing view of a product document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCatalogEntry {
    pub id: ProductId,
    pub name: String,
    pub category: ProductCategory,
    /// Fallback unit price when no metal option is selected or matched.
    pub base_price: Decimal,
    #[serde(default)]
    pub metal_options: Vec<MetalOption>,
    #[serde(default)]
    pub size_options: Vec<SizeOption>,
    /// Sale discount in percent; `None` or zero means full price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
}

impl VariantCatalogEntry {
    /// Create an entry with no options.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: ProductCategory,
        base_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            base_price,
            metal_options: Vec::new(),
            size_options: Vec::new(),
            discount_percentage: None,
        }
    }

    /// The metal option matching `(karat, color)`, if any.
    #[must_use]
    pub fn metal_option(&self, karat: &str, color: &str) -> Option<&MetalOption> {
        self.metal_options.iter().find(|m| m.matches(karat, color))
    }

    /// The metal option flagged as default, if any.
    #[must_use]
    pub fn default_metal(&self) -> Option<&MetalOption> {
        self.metal_options.iter().find(|m| m.is_default)
    }

    /// The size option for `size`, regardless of availability.
    #[must_use]
    pub fn size_option(&self, size: RingSize) -> Option<&SizeOption> {
        self.size_options.iter().find(|s| s.size == size)
    }

    /// Sizes a customer can currently pick, in catalog order.
    pub fn available_sizes(&self) -> impl Iterator<Item = RingSize> + '_ {
        self.size_options
            .iter()
            .filter(|s| s.is_available)
            .map(|s| s.size)
    }

    /// Active sale discount, if the product is on sale.
    #[must_use]
    pub fn active_discount(&self) -> Option<Decimal> {
        self.discount_percentage.filter(|pct| *pct > Decimal::ZERO)
    }

    /// Check the list invariants an admin edit must preserve.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found: negative prices, an
    /// out-of-range discount, duplicate metals or sizes, or a non-empty metal
    /// list without exactly one default.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.base_price.is_sign_negative() {
            return Err(CatalogError::NegativePrice("base price"));
        }
        if let Some(pct) = self.discount_percentage
            && (pct.is_sign_negative() || pct > Decimal::ONE_HUNDRED)
        {
            return Err(CatalogError::InvalidDiscount);
        }

        let mut metals = HashSet::new();
        for option in &self.metal_options {
            if option.price.is_sign_negative() {
                return Err(CatalogError::NegativePrice("metal option price"));
            }
            if !metals.insert((option.karat.as_str(), option.color.as_str())) {
                return Err(CatalogError::DuplicateMetalOption {
                    karat: option.karat.clone(),
                    color: option.color.clone(),
                });
            }
        }
        if !self.metal_options.is_empty() {
            let defaults = self.metal_options.iter().filter(|m| m.is_default).count();
            if defaults != 1 {
                return Err(CatalogError::DefaultMetalCount(defaults));
            }
        }

        let mut sizes = HashSet::new();
        for option in &self.size_options {
            if option.additional_price.is_sign_negative() {
                return Err(CatalogError::NegativePrice("size additional price"));
            }
            if !sizes.insert(option.size) {
                return Err(CatalogError::DuplicateSize(option.size));
            }
        }

        Ok(())
    }
}
