//! Product route handlers.
//!
//! Product pages price every selection change through the server so the
//! number a customer sees is the number the cart will hold.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use aurum_core::pricing::resolve_sale_unit_price;
use aurum_core::{PriceSelection, ProductId, RingSize, VariantCatalogEntry};

use crate::error::Result;
use crate::state::AppState;

/// Product detail with its default pricing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: VariantCatalogEntry,
    /// Default metal, no size.
    pub default_selection: PriceSelection,
    /// Unit price for the default selection, before any sale.
    pub price: Decimal,
    /// Sale price for the default selection, when on sale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    pub available_sizes: Vec<RingSize>,
    pub requires_size: bool,
}

/// Selection query for a price lookup.
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub karat: Option<String>,
    pub color: Option<String>,
    pub size: Option<RingSize>,
}

/// Resolved price of one selection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceView {
    pub product_id: ProductId,
    pub selection: PriceSelection,
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

/// Price `selection`, returning the full and (when on sale) sale price.
fn price_pair(
    entry: &VariantCatalogEntry,
    selection: &PriceSelection,
) -> Result<(Decimal, Option<Decimal>)> {
    let unit_price = selection.resolve(entry)?;
    let sale_price = match entry.active_discount() {
        Some(_) => Some(resolve_sale_unit_price(entry, selection)?),
        None => None,
    };
    Ok((unit_price, sale_price))
}

/// Display product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = state.checkout().product(&id).await?;
    let default_selection = PriceSelection::default_for(&product);
    let (price, sale_price) = price_pair(&product, &default_selection)?;

    Ok(Json(ProductView {
        available_sizes: product.available_sizes().collect(),
        requires_size: product.category.requires_size(),
        default_selection,
        price,
        sale_price,
        product,
    }))
}

/// Resolve the price of a metal and size selection.
///
/// Omitting both karat and color prices the default metal. An unavailable
/// size is a 400, never a silent fallback.
#[instrument(skip(state))]
pub async fn price(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceView>> {
    let product = state.checkout().product(&id).await?;
    let selection =
        PriceSelection::or_default_metal(&product, query.karat, query.color, query.size);
    let (unit_price, sale_price) = price_pair(&product, &selection)?;

    Ok(Json(PriceView {
        product_id: product.id.clone(),
        selection,
        unit_price,
        sale_price,
        discount_percentage: product.active_discount(),
    }))
}
