//! Order payloads handed to the order writer.
//!
//! The storefront never persists orders itself; it builds an
//! [`OrderPayload`] from reconciled cart lines and the aggregation result and
//! passes it to whatever writes orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, Customization, MetalSelection};
use crate::catalog::RingSize;
use crate::checkout::CartAggregationResult;
use crate::shipping::ShippingMethod;
use crate::types::{Email, OrderStatus, PaymentIntentId, ProductId, round2};

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// One purchased line as recorded on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<RingSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metal_option: Option<MetalSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.resolved_unit_price,
            quantity: line.quantity.get(),
            size: line.size,
            metal_option: line.metal_option.clone(),
            customization: line.customization.clone(),
        }
    }
}

/// Rounded pricing block stored with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_method: ShippingMethod,
}

impl From<&CartAggregationResult> for OrderPricing {
    fn from(result: &CartAggregationResult) -> Self {
        Self {
            subtotal: round2(result.subtotal),
            shipping: round2(result.shipping),
            tax: round2(result.tax),
            total: round2(result.total),
            shipping_method: result.shipping_method,
        }
    }
}

/// Everything the order writer needs to persist an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub items: Vec<OrderItem>,
    pub pricing: OrderPricing,
    pub customer_email: Email,
    pub shipping_address: ShippingAddress,
    pub payment_intent_id: PaymentIntentId,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

impl OrderPayload {
    /// Build a paid order from reconciled lines and their aggregation.
    #[must_use]
    pub fn paid(
        lines: &[CartLine],
        totals: &CartAggregationResult,
        customer_email: Email,
        shipping_address: ShippingAddress,
        payment_intent_id: PaymentIntentId,
    ) -> Self {
        Self {
            items: lines.iter().map(OrderItem::from).collect(),
            pricing: OrderPricing::from(totals),
            customer_email,
            shipping_address,
            payment_intent_id,
            status: OrderStatus::Paid,
            placed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::catalog::ProductCategory;
    use crate::checkout::aggregate;

    #[test]
    fn test_paid_order_rounds_pricing_and_copies_lines() {
        let mut line = CartLine::new(
            "gem-1",
            ProductCategory::Gemstone,
            Decimal::new(3_333, 3),
            NonZeroU32::new(3).unwrap(),
        );
        line.name = "Sapphire".into();
        let totals = aggregate(std::slice::from_ref(&line), "standard").unwrap();

        let order = OrderPayload::paid(
            &[line],
            &totals,
            Email::parse("buyer@example.com").unwrap(),
            ShippingAddress {
                full_name: "Ana Buyer".into(),
                line1: "1 Main St".into(),
                line2: None,
                city: "Springfield".into(),
                state: "IL".into(),
                postal_code: "62701".into(),
                country: "US".into(),
            },
            PaymentIntentId::new("pi_123"),
        );

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.pricing.subtotal, Decimal::new(1000, 2));
        assert_eq!(order.pricing.tax, Decimal::new(80, 2));
        assert_eq!(order.pricing.total, Decimal::new(1679, 2));

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["pricing"]["shippingMethod"], "standard");
        assert_eq!(json["customerEmail"], "buyer@example.com");
    }
}
