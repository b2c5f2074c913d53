//! Unit price resolution.
//!
//! The resolved unit price of a variant is:
//!
//! 1. the price of the metal option matching the selected karat and color,
//!    or the entry's base price when nothing matches;
//! 2. plus the selected ring size's additional price.
//!
//! A size that is not offered, or is currently unavailable, is an error
//! rather than a silent zero adder. Callers that want a fallback (for example
//! "price without size" on a product page) must ask for it explicitly by
//! resolving with no size.
//!
//! Sale discounts and ring customization are layered on top of the resolver
//! by [`resolve_sale_unit_price`] and [`resolve_customized_unit_price`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{ComponentPrices, MetalSelection};
use crate::catalog::{RingSize, VariantCatalogEntry};
use crate::error::PricingError;
use crate::types::round2;

/// The customer's current variant selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub karat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<RingSize>,
}

impl PriceSelection {
    /// Selection of the entry's default metal and no size.
    #[must_use]
    pub fn default_for(entry: &VariantCatalogEntry) -> Self {
        entry.default_metal().map_or_else(Self::default, |metal| Self {
            karat: Some(metal.karat.clone()),
            color: Some(metal.color.clone()),
            size: None,
        })
    }

    /// The customer's selection, falling back to the default metal when
    /// neither karat nor color was chosen.
    #[must_use]
    pub fn or_default_metal(
        entry: &VariantCatalogEntry,
        karat: Option<String>,
        color: Option<String>,
        size: Option<RingSize>,
    ) -> Self {
        if karat.is_none() && color.is_none() {
            Self::default_for(entry).with_size(size)
        } else {
            Self { karat, color, size }
        }
    }

    /// Builder-style size setter.
    #[must_use]
    pub fn with_size(mut self, size: Option<RingSize>) -> Self {
        self.size = size;
        self
    }

    /// The selected metal, when both karat and color are set.
    #[must_use]
    pub fn metal(&self) -> Option<MetalSelection> {
        match (&self.karat, &self.color) {
            (Some(karat), Some(color)) => Some(MetalSelection {
                karat: karat.clone(),
                color: color.clone(),
            }),
            _ => None,
        }
    }

    /// Resolve this selection against `entry`.
    ///
    /// # Errors
    ///
    /// See [`resolve_unit_price`].
    pub fn resolve(&self, entry: &VariantCatalogEntry) -> Result<Decimal, PricingError> {
        resolve_unit_price(
            entry,
            self.karat.as_deref(),
            self.color.as_deref(),
            self.size,
        )
    }
}

/// Resolve the unit price of `entry` for a metal and size selection.
///
/// # Errors
///
/// Returns [`PricingError::InvalidSizeSelection`] if `size` is given but is
/// not listed for the entry or is marked unavailable.
pub fn resolve_unit_price(
    entry: &VariantCatalogEntry,
    karat: Option<&str>,
    color: Option<&str>,
    size: Option<RingSize>,
) -> Result<Decimal, PricingError> {
    let metal_price = match (karat, color) {
        (Some(karat), Some(color)) => entry.metal_option(karat, color).map(|m| m.price),
        _ => None,
    };
    let base = metal_price.unwrap_or(entry.base_price);

    let Some(size) = size else {
        return Ok(base);
    };
    match entry.size_option(size) {
        Some(option) if option.is_available => Ok(base + option.additional_price),
        _ => Err(PricingError::InvalidSizeSelection { size }),
    }
}

/// Apply a percentage discount, rounding the sale price to cents.
#[must_use]
pub fn apply_discount(unit_price: Decimal, discount_percentage: Decimal) -> Decimal {
    let factor = Decimal::ONE - discount_percentage / Decimal::ONE_HUNDRED;
    round2(unit_price * factor)
}

/// Resolve the unit price and apply the entry's sale discount, if any.
///
/// # Errors
///
/// See [`resolve_unit_price`].
pub fn resolve_sale_unit_price(
    entry: &VariantCatalogEntry,
    selection: &PriceSelection,
) -> Result<Decimal, PricingError> {
    let unit = selection.resolve(entry)?;
    Ok(entry
        .active_discount()
        .map_or(unit, |pct| apply_discount(unit, pct)))
}

/// Price a customized ring: a setting plus a loose stone.
///
/// The setting is priced with the customer's metal and size selection; the
/// stone is priced at its own (sale) base price. Returns the component
/// breakdown; the unit price is [`ComponentPrices::total`].
///
/// # Errors
///
/// See [`resolve_unit_price`].
pub fn resolve_customized_unit_price(
    setting: &VariantCatalogEntry,
    selection: &PriceSelection,
    stone: &VariantCatalogEntry,
) -> Result<ComponentPrices, PricingError> {
    Ok(ComponentPrices {
        setting: resolve_sale_unit_price(setting, selection)?,
        stone: resolve_sale_unit_price(stone, &PriceSelection::default())?,
    })
}
