//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Health check
//!
//! # Products
//! GET    /products/{id}                  - Product detail with default price
//! GET    /products/{id}/price            - Price of ?karat&color&size
//!
//! # Cart (session)
//! GET    /cart                           - Cart with subtotal and gate
//! POST   /cart/items                     - Add line (server resolves price)
//! PATCH  /cart/items/{line_id}           - Update quantity and/or size
//! DELETE /cart/items/{line_id}           - Remove line
//!
//! # Checkout
//! GET    /checkout/shipping-methods      - Shipping tiers
//! POST   /checkout/quote                 - Reconcile + gate + totals
//! POST   /checkout/payment-intent        - Create charge intent
//! POST   /checkout/orders                - Verify payment, write order
//! ```

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route("/{id}/price", get(products::price))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{line_id}", patch(cart::update).delete(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/shipping-methods", get(checkout::shipping_methods))
        .route("/quote", post(checkout::quote))
        .route("/payment-intent", post(checkout::create_payment_intent))
        .route("/orders", post(checkout::place_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
