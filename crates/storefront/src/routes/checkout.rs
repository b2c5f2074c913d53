//! Checkout route handlers.
//!
//! Quote, pay, place. Each step re-reads the session cart and re-prices it
//! from the catalog before anything is charged or written.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aurum_core::{
    CartAggregationResult, CartLine, CheckoutGate, Email, OrderNumber, PaymentIntentId, Price,
    ShippingAddress, ShippingMethod,
};

use super::cart::{load_cart, save_cart};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::{PlaceOrder, Quote};
use crate::state::AppState;

fn default_shipping_method() -> String {
    ShippingMethod::default().id().to_string()
}

/// Body of quote and payment-intent requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    #[serde(default = "default_shipping_method")]
    pub shipping_method: String,
}

/// Body of an order placement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default = "default_shipping_method")]
    pub shipping_method: String,
    pub payment_intent_id: PaymentIntentId,
    pub email: String,
    pub shipping_address: ShippingAddress,
}

/// A shipping tier as offered to the customer.
#[derive(Debug, Serialize)]
pub struct ShippingMethodView {
    pub id: &'static str,
    pub label: &'static str,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    pub lines: Vec<CartLine>,
    /// Totals rounded to cents.
    pub totals: CartAggregationResult,
    pub gate: CheckoutGate,
}

impl From<Quote> for QuoteView {
    fn from(quote: Quote) -> Self {
        Self {
            lines: quote.lines,
            totals: quote.totals.rounded(),
            gate: quote.gate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentView {
    pub payment_intent_id: PaymentIntentId,
    pub client_secret: String,
    pub amount: Price,
    pub totals: CartAggregationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_number: OrderNumber,
    pub totals: CartAggregationResult,
}

/// List the shipping tiers.
pub async fn shipping_methods() -> Json<Vec<ShippingMethodView>> {
    Json(
        ShippingMethod::ALL
            .iter()
            .map(|m| ShippingMethodView {
                id: m.id(),
                label: m.label(),
                price: m.price(),
            })
            .collect(),
    )
}

/// Quote the session cart.
///
/// Reconciled prices are written back to the session.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ShippingRequest>,
) -> Result<Json<QuoteView>> {
    let mut cart = load_cart(&session).await?;
    let quote = state
        .checkout()
        .quote(cart.lines(), &request.shipping_method)
        .await?;

    cart.replace_lines(quote.lines.clone());
    save_cart(&session, &cart).await?;

    Ok(Json(quote.into()))
}

/// Create a payment intent for the session cart.
///
/// The intent's checkout reference is kept in the session; only this
/// session can place an order against the intent.
#[instrument(skip(state, session))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ShippingRequest>,
) -> Result<(StatusCode, Json<PaymentIntentView>)> {
    let mut cart = load_cart(&session).await?;
    let pending = state
        .checkout()
        .create_payment_intent(cart.lines(), &request.shipping_method)
        .await?;
    let (intent, quote) = (pending.intent, pending.quote);

    cart.replace_lines(quote.lines);
    save_cart(&session, &cart).await?;
    session
        .insert(session_keys::CHECKOUT_REF, &pending.checkout_ref)
        .await?;

    add_breadcrumb(
        "checkout",
        "Payment intent created",
        Some(&[("payment_intent_id", intent.id.as_str())]),
    );

    let totals = quote.totals.rounded();
    Ok((
        StatusCode::CREATED,
        Json(PaymentIntentView {
            client_secret: intent.client_secret.expose_secret().to_string(),
            payment_intent_id: intent.id,
            amount: Price::usd(totals.total),
            totals,
        }),
    ))
}

/// Place the order once the payment has succeeded, then empty the cart.
///
/// The checkout reference stays in the session; a replayed intent is
/// refused by the order writer.
#[instrument(skip(state, session, request), fields(payment_intent_id = %request.payment_intent_id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let customer_email = Email::parse(&request.email)
        .map_err(|e| AppError::BadRequest(format!("invalid email: {e}")))?;

    let mut cart = load_cart(&session).await?;
    let checkout_ref = session
        .get::<String>(session_keys::CHECKOUT_REF)
        .await?;
    let placed = state
        .checkout()
        .place_order(
            cart.lines(),
            PlaceOrder {
                shipping_method: request.shipping_method,
                payment_intent_id: request.payment_intent_id,
                checkout_ref,
                customer_email,
                shipping_address: request.shipping_address,
            },
        )
        .await?;

    cart.clear();
    save_cart(&session, &cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderView {
            order_number: placed.order_number,
            totals: placed.totals,
        }),
    ))
}
