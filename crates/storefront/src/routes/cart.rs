//! Cart route handlers.
//!
//! The cart lives in the session. Every line is priced on the server when it
//! is added or resized; the client only ever sends selections.

use std::num::NonZeroU32;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aurum_core::{
    Cart, CartError, CartLine, CheckoutGate, LineId, RingSize, round2, validate_for_checkout,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::LineRequest;
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    /// Rounded sum of line totals.
    pub subtotal: Decimal,
    pub gate: CheckoutGate,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let lines = cart.lines().to_vec();
        Self {
            item_count: cart.item_count(),
            subtotal: round2(lines.iter().map(CartLine::line_total).sum()),
            gate: validate_for_checkout(&lines),
            lines,
        }
    }
}

/// Update of a single line; at least one field must be set.
#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub quantity: Option<NonZeroU32>,
    pub size: Option<RingSize>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session (empty if none).
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart in the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Display the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a line to the cart.
#[instrument(skip(state, session, request), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LineRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let line = state.checkout().build_line(request).await?;
    let product_id = line.product_id.to_string();

    let mut cart = load_cart(&session).await?;
    let line_id = cart.add(line);
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str()), ("line_id", line_id.as_str())]),
    );

    Ok((StatusCode::CREATED, Json(CartView::from(&cart))))
}

/// Change a line's quantity and/or ring size.
///
/// A new size re-prices the line against the catalog.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<LineId>,
    Json(request): Json<UpdateLineRequest>,
) -> Result<Json<CartView>> {
    if request.quantity.is_none() && request.size.is_none() {
        return Err(AppError::BadRequest(
            "nothing to update: set quantity or size".to_string(),
        ));
    }

    let mut cart = load_cart(&session).await?;

    if let Some(size) = request.size {
        let line = cart
            .line(&line_id)
            .cloned()
            .ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;
        let resized = state.checkout().resize(line, size).await?;
        cart.replace_line(resized)?;
    }
    if let Some(quantity) = request.quantity {
        cart.set_quantity(&line_id, quantity)?;
    }

    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(line_id): Path<LineId>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(&line_id)?;
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
