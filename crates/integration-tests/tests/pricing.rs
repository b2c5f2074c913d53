//! Variant pricing through the product and cart routes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use aurum_core::ProductId;
use aurum_integration_tests::{TestContext, dec};
use aurum_storefront::collaborators::CatalogStore;

#[tokio::test]
async fn test_metal_and_size_priced() {
    let mut ctx = TestContext::new();
    let (status, price) = ctx
        .get("/products/ring-solitaire/price?karat=14K&color=White%20Gold&size=7.0")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&price["unitPrice"]), Decimal::new(575, 0));
    assert!(price.get("salePrice").is_none());
}

#[tokio::test]
async fn test_unmatched_metal_falls_back_to_base_price() {
    let mut ctx = TestContext::new();
    let (status, price) = ctx
        .get("/products/ring-solitaire/price?karat=18K&color=Rose%20Gold&size=7.0")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&price["unitPrice"]), Decimal::new(525, 0));
}

#[tokio::test]
async fn test_unavailable_and_unlisted_sizes_rejected() {
    let mut ctx = TestContext::new();
    let (status, _) = ctx.get("/products/ring-solitaire/price?size=9.0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.get("/products/ring-solitaire/price?size=12").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_detail_lists_available_sizes_only() {
    let mut ctx = TestContext::new();
    let (status, product) = ctx.get("/products/ring-solitaire").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["requiresSize"], true);
    assert_eq!(product["defaultSelection"]["karat"], "14K");
    assert_eq!(dec(&product["price"]), Decimal::new(550, 0));
    assert_eq!(product["availableSizes"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_sale_price_rounded_to_cents() {
    let mut ctx = TestContext::new();
    let (status, product) = ctx.get("/products/pendant-halo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&product["price"]), Decimal::new(32050, 2));
    // 320.50 at 15% off = 272.425
    assert_eq!(dec(&product["salePrice"]), Decimal::new(27243, 2));

    let (_, cart) = ctx
        .post("/cart/items", json!({"productId": "pendant-halo"}))
        .await;
    assert_eq!(
        dec(&cart["lines"][0]["resolvedUnitPrice"]),
        Decimal::new(27243, 2)
    );
}

#[tokio::test]
async fn test_unknown_product_not_found() {
    let mut ctx = TestContext::new();
    let (status, body) = ctx.get("/products/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = ctx.post("/cart/items", json!({"productId": "nope"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_express_quote_totals() {
    let mut ctx = TestContext::new();
    ctx.post("/cart/items", json!({"productId": "bracelet-tennis"}))
        .await;
    ctx.post(
        "/cart/items",
        json!({"productId": "earrings-studs", "quantity": 2}),
    )
    .await;

    let (status, quote) = ctx
        .post("/checkout/quote", json!({"shippingMethod": "express"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let totals = &quote["totals"];
    assert_eq!(dec(&totals["subtotal"]), Decimal::new(815, 0));
    assert_eq!(dec(&totals["shipping"]), Decimal::new(1599, 2));
    assert_eq!(dec(&totals["tax"]), Decimal::new(6520, 2));
    assert_eq!(dec(&totals["total"]), Decimal::new(89619, 2));
    assert_eq!(quote["gate"]["status"], "ready");
}

#[tokio::test]
async fn test_customized_ring_prices_setting_and_sale_stone() {
    let mut ctx = TestContext::new();
    let (status, cart) = ctx
        .post(
            "/cart/items",
            json!({
                "productId": "ring-solitaire",
                "size": "7.0",
                "stoneId": "diamond-round-1ct"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let line = &cart["lines"][0];
    let components = &line["customization"]["componentPrices"];
    assert_eq!(dec(&components["setting"]), Decimal::new(575, 0));
    // 4200 at 10% off
    assert_eq!(dec(&components["stone"]), Decimal::new(3780, 0));
    assert_eq!(dec(&line["resolvedUnitPrice"]), Decimal::new(4355, 0));
}

#[tokio::test]
async fn test_stone_must_be_loose_stone_on_ring() {
    let mut ctx = TestContext::new();
    let (status, _) = ctx
        .post(
            "/cart/items",
            json!({"productId": "necklace-pearl", "stoneId": "diamond-round-1ct"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(
            "/cart/items",
            json!({"productId": "ring-solitaire", "size": "7.0", "stoneId": "necklace-pearl"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_price_change_applied_at_quote() {
    let mut ctx = TestContext::new();
    ctx.post("/cart/items", json!({"productId": "necklace-pearl"}))
        .await;

    let mut necklace = ctx
        .store
        .product_detail(&ProductId::new("necklace-pearl"))
        .await
        .unwrap()
        .unwrap();
    necklace.base_price = Decimal::new(140, 0);
    ctx.store.upsert_product(necklace).await;

    let (_, quote) = ctx.post("/checkout/quote", json!({})).await;
    assert_eq!(
        dec(&quote["lines"][0]["resolvedUnitPrice"]),
        Decimal::new(140, 0)
    );
    assert_eq!(dec(&quote["totals"]["subtotal"]), Decimal::new(140, 0));

    // Reconciled price is written back to the session.
    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(dec(&cart["subtotal"]), Decimal::new(140, 0));
}
