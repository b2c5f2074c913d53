//! Offline cart quotes.
//!
//! Prices a YAML cart file against a catalog file with the same rules the
//! storefront uses, which makes it handy for checking a catalog edit before
//! it ships.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use aurum_core::{
    CartAggregationResult, CartLine, CheckoutGate, PriceSelection, PricingError, ProductId,
    RingSize, VariantCatalogEntry, aggregate, validate_for_checkout,
};

use super::catalog::{CatalogFileError, parse_catalog};

/// Errors from pricing a cart file.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Catalog(#[from] CatalogFileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cart file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cart references unknown product {0}")]
    UnknownProduct(ProductId),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// One line of a cart file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFileLine {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: NonZeroU32,
    #[serde(default)]
    pub karat: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<RingSize>,
}

const fn one() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// A priced cart.
#[derive(Debug)]
pub struct CartQuote {
    pub lines: Vec<CartLine>,
    pub totals: CartAggregationResult,
    pub gate: CheckoutGate,
}

/// Price `cart` against `catalog`.
///
/// Lines without a metal get the product's default metal.
pub fn quote_cart(
    catalog: &[VariantCatalogEntry],
    cart: Vec<CartFileLine>,
    shipping_method: &str,
) -> Result<CartQuote, QuoteError> {
    let by_id: HashMap<&ProductId, &VariantCatalogEntry> =
        catalog.iter().map(|e| (&e.id, e)).collect();

    let mut lines = Vec::with_capacity(cart.len());
    for item in cart {
        let entry = by_id
            .get(&item.product_id)
            .ok_or_else(|| QuoteError::UnknownProduct(item.product_id.clone()))?;

        let selection =
            PriceSelection::or_default_metal(entry, item.karat, item.color, item.size);
        let line = CartLine::from_selection(entry, &selection, item.quantity)?;
        lines.push(line);
    }

    let totals = aggregate(&lines, shipping_method)?;
    let gate = validate_for_checkout(&lines);
    Ok(CartQuote {
        lines,
        totals,
        gate,
    })
}

/// Load both files, price the cart and log the quote.
///
/// # Errors
///
/// Returns an error if either file is unreadable, a product is unknown, a
/// size is unavailable or the shipping method is not recognised.
pub async fn run(catalog_path: &Path, cart_path: &Path, shipping: &str) -> Result<(), QuoteError> {
    let catalog = parse_catalog(&tokio::fs::read_to_string(catalog_path).await?)?;
    let cart: Vec<CartFileLine> =
        serde_yaml::from_str(&tokio::fs::read_to_string(cart_path).await?)?;

    let quote = quote_cart(&catalog, cart, shipping)?;

    for line in &quote.lines {
        info!(
            product_id = %line.product_id,
            name = %line.name,
            quantity = line.quantity.get(),
            unit_price = %line.resolved_unit_price,
            line_total = %line.line_total(),
            "Line"
        );
    }

    let totals = quote.totals.rounded();
    info!(
        subtotal = %totals.subtotal,
        shipping = %totals.shipping,
        shipping_method = %totals.shipping_method,
        tax = %totals.tax,
        total = %totals.total,
        "Quote"
    );

    if let CheckoutGate::Blocked {
        incomplete_line_ids,
    } = &quote.gate
    {
        warn!(
            lines = incomplete_line_ids.len(),
            "Cart is not ready for checkout: ring lines need a size"
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const CATALOG: &str = r#"
- id: ring-1
  name: Classic Solitaire
  category: ring
  basePrice: "500"
  metalOptions:
    - { karat: 14K, color: White Gold, price: "550", isDefault: true }
  sizeOptions:
    - { size: "7.0", additionalPrice: "25" }
    - { size: "7.5", additionalPrice: "30" }
- id: bracelet-1
  name: Tennis Bracelet
  category: bracelet
  basePrice: "575"
- id: earrings-1
  name: Diamond Studs
  category: earrings
  basePrice: "120"
"#;

    fn cart(yaml: &str) -> Vec<CartFileLine> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_quote_two_lines_express() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let quote = quote_cart(
            &catalog,
            cart("[{productId: bracelet-1}, {productId: earrings-1, quantity: 2}]"),
            "express",
        )
        .unwrap();
        let totals = quote.totals.rounded();
        assert_eq!(totals.subtotal, Decimal::new(815, 0));
        assert_eq!(totals.shipping, Decimal::new(1599, 2));
        assert_eq!(totals.tax, Decimal::new(6520, 2));
        assert_eq!(totals.total, Decimal::new(89619, 2));
        assert!(quote.gate.is_ready());
    }

    #[test]
    fn test_sized_ring_uses_default_metal() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let quote = quote_cart(
            &catalog,
            cart(r#"[{productId: ring-1, size: "7.0"}]"#),
            "standard",
        )
        .unwrap();
        assert_eq!(quote.lines[0].resolved_unit_price, Decimal::new(575, 0));
    }

    #[test]
    fn test_unsized_ring_blocks_gate() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let quote = quote_cart(&catalog, cart("[{productId: ring-1}]"), "standard").unwrap();
        assert!(!quote.gate.is_ready());
    }

    #[test]
    fn test_unlisted_size_fails() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let err = quote_cart(
            &catalog,
            cart(r#"[{productId: ring-1, size: "12"}]"#),
            "standard",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QuoteError::Pricing(PricingError::InvalidSizeSelection { .. })
        ));
    }

    #[test]
    fn test_unknown_product_and_shipping() {
        let catalog = parse_catalog(CATALOG).unwrap();
        assert!(matches!(
            quote_cart(&catalog, cart("[{productId: nope}]"), "standard"),
            Err(QuoteError::UnknownProduct(_))
        ));
        assert!(matches!(
            quote_cart(&catalog, Vec::new(), "pigeon"),
            Err(QuoteError::Pricing(PricingError::UnknownShippingMethod(_)))
        ));
    }
}
