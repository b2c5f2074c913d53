//! Cart lines and the session-held cart.
//!
//! A [`CartLine`] records the selection a customer made and the unit price
//! resolved for it at selection time. The [`Cart`] is the ordered list of
//! lines kept in the customer's session; only the customer's own actions
//! mutate it.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{ProductCategory, RingSize, VariantCatalogEntry};
use crate::error::{CartError, PricingError};
use crate::pricing::{PriceSelection, resolve_sale_unit_price};
use crate::types::{LineId, ProductId};

/// A chosen metal, identified by karat and color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetalSelection {
    pub karat: String,
    pub color: String,
}

/// Price breakdown of a customized ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPrices {
    pub setting: Decimal,
    pub stone: Decimal,
}

impl ComponentPrices {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.setting + self.stone
    }
}

/// Setting + stone customization carried by a ring line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub is_customized: bool,
    pub component_prices: ComponentPrices,
    /// The loose diamond or gemstone paired with the setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stone_id: Option<ProductId>,
}

/// One resolved variant and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: LineId,
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    pub category: ProductCategory,
    /// Unit price including metal, size and customization.
    pub resolved_unit_price: Decimal,
    pub quantity: NonZeroU32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<RingSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metal_option: Option<MetalSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

impl CartLine {
    /// Create a line with a fresh ID and no size, metal or customization.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        category: ProductCategory,
        resolved_unit_price: Decimal,
        quantity: NonZeroU32,
    ) -> Self {
        Self {
            id: LineId::generate(),
            product_id: product_id.into(),
            name: String::new(),
            category,
            resolved_unit_price,
            quantity,
            size: None,
            metal_option: None,
            customization: None,
        }
    }

    /// A line for `selection` of `entry`, priced at the sale unit price.
    ///
    /// The metal is recorded only when it names one of the entry's options;
    /// an unmatched metal is priced at the base price and left off the line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidSizeSelection`] for a size the entry
    /// does not offer.
    pub fn from_selection(
        entry: &VariantCatalogEntry,
        selection: &PriceSelection,
        quantity: NonZeroU32,
    ) -> Result<Self, PricingError> {
        let mut line = Self::new(
            entry.id.clone(),
            entry.category,
            resolve_sale_unit_price(entry, selection)?,
            quantity,
        );
        line.name.clone_from(&entry.name);
        line.size = selection.size;
        line.metal_option = selection
            .metal()
            .filter(|m| entry.metal_option(&m.karat, &m.color).is_some());
        Ok(line)
    }

    /// `resolved_unit_price * quantity`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.resolved_unit_price * Decimal::from(self.quantity.get())
    }

    /// Whether this line blocks checkout for lack of a ring size.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        self.category.requires_size() && self.size.is_none()
    }

    /// Whether the line is a setting + stone build.
    #[must_use]
    pub fn is_customized(&self) -> bool {
        self.customization.as_ref().is_some_and(|c| c.is_customized)
    }

    /// The selection this line was priced with.
    #[must_use]
    pub fn selection(&self) -> PriceSelection {
        PriceSelection {
            karat: self.metal_option.as_ref().map(|m| m.karat.clone()),
            color: self.metal_option.as_ref().map(|m| m.color.clone()),
            size: self.size,
        }
    }

    fn same_variant(&self, other: &Self) -> bool {
        !self.is_customized()
            && !other.is_customized()
            && self.product_id == other.product_id
            && self.metal_option == other.metal_option
            && self.size == other.size
    }
}

/// The customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .map(|l| l.quantity.get())
            .fold(0, u32::saturating_add)
    }

    /// Add a line, merging it into an existing line for the same variant.
    ///
    /// Customized lines are never merged. A merged line keeps its own ID and
    /// takes the incoming resolved price. Returns the ID of the line that now
    /// holds the units.
    pub fn add(&mut self, line: CartLine) -> LineId {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.same_variant(&line)) {
            existing.quantity = existing.quantity.saturating_add(line.quantity.get());
            existing.resolved_unit_price = line.resolved_unit_price;
            return existing.id.clone();
        }
        let id = line.id.clone();
        self.lines.push(line);
        id
    }

    /// Find a line by ID.
    #[must_use]
    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    fn line_mut(&mut self, id: &LineId) -> Result<&mut CartLine, CartError> {
        self.lines
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| CartError::LineNotFound(id.clone()))
    }

    /// Change the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line.
    pub fn set_quantity(&mut self, id: &LineId, quantity: NonZeroU32) -> Result<(), CartError> {
        self.line_mut(id)?.quantity = quantity;
        Ok(())
    }

    /// Set the ring size of a line together with its re-resolved unit price.
    ///
    /// A resized line is not merged into a line of the same variant, so the
    /// ID a client holds stays valid.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line.
    pub fn set_size(
        &mut self,
        id: &LineId,
        size: RingSize,
        resolved_unit_price: Decimal,
    ) -> Result<(), CartError> {
        let line = self.line_mut(id)?;
        line.size = Some(size);
        line.resolved_unit_price = resolved_unit_price;
        Ok(())
    }

    /// Replace the line with the same ID as `line`.
    ///
    /// The line keeps its position and ID even when it now describes the
    /// same variant as another line; lines are only merged by [`Cart::add`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line.
    pub fn replace_line(&mut self, line: CartLine) -> Result<(), CartError> {
        let id = line.id.clone();
        *self.line_mut(&id)? = line;
        Ok(())
    }

    /// Replace every line, e.g. after server-side reconciliation.
    pub fn replace_lines(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line.
    pub fn remove(&mut self, id: &LineId) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| CartError::LineNotFound(id.clone()))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
