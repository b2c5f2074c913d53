//! End-to-end checkout through the storefront router.
//!
//! Cart in the session, quote, payment intent, order placement.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use aurum_core::ChargeStatus;
use aurum_integration_tests::{TestContext, dec};

fn address() -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "line1": "12 Marylebone Road",
        "city": "Portland",
        "state": "OR",
        "postalCode": "97201",
        "country": "US"
    })
}

/// Bracelet plus a sized ring in the default metal.
async fn fill_cart(ctx: &mut TestContext) {
    let (status, _) = ctx
        .post("/cart/items", json!({"productId": "bracelet-tennis"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cart) = ctx
        .post(
            "/cart/items",
            json!({"productId": "ring-solitaire", "size": "7.0"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["lines"].as_array().unwrap().len(), 2);
    assert_eq!(cart["gate"]["status"], "ready");
}

#[tokio::test]
async fn test_full_checkout_places_order_and_empties_cart() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;

    // 575 + 575 = 1150; express 15.99; tax 92.00
    let (status, quote) = ctx
        .post("/checkout/quote", json!({"shippingMethod": "express"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&quote["totals"]["subtotal"]), Decimal::new(1150, 0));
    assert_eq!(dec(&quote["totals"]["tax"]), Decimal::new(92, 0));
    assert_eq!(dec(&quote["totals"]["total"]), Decimal::new(125_799, 2));

    let (status, intent) = ctx
        .post("/checkout/payment-intent", json!({"shippingMethod": "express"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(intent["paymentIntentId"], "pi_integration");
    assert_eq!(intent["clientSecret"], "pi_integration_secret");
    assert_eq!(ctx.gateway.charged_minor(), Some(125_799));
    assert_eq!(ctx.gateway.created()[0]["shipping_method"], "express");

    ctx.gateway.set_status(ChargeStatus::Succeeded);
    let (status, order) = ctx
        .post(
            "/checkout/orders",
            json!({
                "shippingMethod": "express",
                "paymentIntentId": "pi_integration",
                "email": "ada@example.com",
                "shippingAddress": address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(order["orderNumber"].as_str().unwrap().starts_with("AUR-"));

    let orders = ctx.store.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].1.items.len(), 2);

    let (_, cart) = ctx.get("/cart").await;
    assert!(cart["lines"].as_array().unwrap().is_empty());
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_unsized_ring_blocks_payment_until_resized() {
    let mut ctx = TestContext::new();
    let (_, cart) = ctx
        .post("/cart/items", json!({"productId": "ring-solitaire"}))
        .await;
    let line_id = cart["lines"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(cart["gate"]["status"], "blocked");
    assert_eq!(cart["gate"]["incompleteLineIds"][0], line_id.as_str());

    let (status, body) = ctx.post("/checkout/payment-intent", json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["incompleteLineIds"][0], line_id.as_str());
    assert_eq!(ctx.gateway.charged_minor(), None);

    let (status, cart) = ctx
        .patch(&format!("/cart/items/{line_id}"), json!({"size": "7.5"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&cart["lines"][0]["resolvedUnitPrice"]), Decimal::new(580, 0));
    assert_eq!(cart["gate"]["status"], "ready");

    let (status, _) = ctx.post("/checkout/payment-intent", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    // 580 + 5.99 standard + 46.40 tax
    assert_eq!(ctx.gateway.charged_minor(), Some(63_239));
}

#[tokio::test]
async fn test_order_rejected_until_payment_succeeds() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    let (status, _) = ctx.post("/checkout/payment-intent", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    ctx.gateway.set_status(ChargeStatus::Processing);
    let place = json!({
        "paymentIntentId": "pi_integration",
        "email": "ada@example.com",
        "shippingAddress": address()
    });
    let (status, _) = ctx.post("/checkout/orders", place).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(ctx.store.orders().await.is_empty());

    // Cart is kept so the customer can retry.
    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(cart["itemCount"], 2);
}

#[tokio::test]
async fn test_order_rejected_when_total_changed_after_payment() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    ctx.post("/checkout/payment-intent", json!({"shippingMethod": "standard"}))
        .await;
    ctx.gateway.set_status(ChargeStatus::Succeeded);

    let (status, _) = ctx
        .post(
            "/checkout/orders",
            json!({
                "shippingMethod": "overnight",
                "paymentIntentId": "pi_integration",
                "email": "ada@example.com",
                "shippingAddress": address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(ctx.store.orders().await.is_empty());
}

fn place_request() -> Value {
    json!({
        "paymentIntentId": "pi_integration",
        "email": "ada@example.com",
        "shippingAddress": address()
    })
}

#[tokio::test]
async fn test_paid_intent_places_only_one_order() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    ctx.post("/checkout/payment-intent", json!({})).await;
    ctx.gateway.set_status(ChargeStatus::Succeeded);

    let (status, _) = ctx.post("/checkout/orders", place_request()).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same cart again, paid with the same intent.
    fill_cart(&mut ctx).await;
    let (status, body) = ctx.post("/checkout/orders", place_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already has an order"));

    assert_eq!(ctx.store.orders().await.len(), 1);
    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(cart["itemCount"], 2);
}

#[tokio::test]
async fn test_intent_created_by_another_session_rejected() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    ctx.post("/checkout/payment-intent", json!({})).await;
    ctx.gateway.set_status(ChargeStatus::Succeeded);

    // A second visitor with an identical cart, so the amount matches.
    ctx.clear_session();
    fill_cart(&mut ctx).await;
    let (status, _) = ctx.post("/checkout/orders", place_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(ctx.store.orders().await.is_empty());

    // Their own intent works.
    ctx.post("/checkout/payment-intent", json!({})).await;
    let (status, _) = ctx.post("/checkout/orders", place_request()).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_intent_id_with_path_characters_rejected() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    ctx.post("/checkout/payment-intent", json!({})).await;
    ctx.gateway.set_status(ChargeStatus::Succeeded);

    for id in ["../customers?limit=1", "pi_integration/cancel"] {
        let mut request = place_request();
        request["paymentIntentId"] = json!(id);
        let (status, body) = ctx.post("/checkout/orders", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{id}");
        assert!(body["error"].as_str().unwrap().contains("malformed"));
    }
    assert!(ctx.store.orders().await.is_empty());
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    ctx.post("/checkout/payment-intent", json!({})).await;
    ctx.gateway.set_status(ChargeStatus::Succeeded);

    let (status, body) = ctx
        .post(
            "/checkout/orders",
            json!({
                "paymentIntentId": "pi_integration",
                "email": "not-an-email",
                "shippingAddress": address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_empty_cart_cannot_be_charged() {
    let mut ctx = TestContext::new();
    let (status, _) = ctx.post("/checkout/payment-intent", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_shipping_method_rejected() {
    let mut ctx = TestContext::new();
    fill_cart(&mut ctx).await;
    let (status, _) = ctx
        .post("/checkout/quote", json!({"shippingMethod": "pigeon"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shipping_methods_listed() {
    let mut ctx = TestContext::new();
    let (status, methods) = ctx.get("/checkout/shipping-methods").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = methods
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["standard", "express", "overnight"]);
}
