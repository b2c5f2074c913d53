//! Checkout orchestration.
//!
//! Every price that reaches the payment gateway is recomputed here from the
//! catalog: lines coming out of the session are re-resolved against the
//! current product documents, gated, aggregated and only then charged.

use std::num::NonZeroU32;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use aurum_core::pricing::{resolve_customized_unit_price, resolve_sale_unit_price};
use aurum_core::{
    CartAggregationResult, CartLine, CheckoutGate, CurrencyCode, Customization, Email,
    OrderNumber, OrderPayload, PaymentIntentId, PriceSelection, ProductId, RingSize,
    ShippingAddress, VariantCatalogEntry, aggregate, validate_for_checkout,
};

use crate::collaborators::{
    CHECKOUT_REF_KEY, CatalogStore, ChargeIntent, ChargeMetadata, OrderWriter, PaymentError,
    PaymentGateway,
};
use crate::error::{AppError, Result};

/// A request to add a variant to the cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: NonZeroU32,
    #[serde(default)]
    pub karat: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<RingSize>,
    /// Loose stone to set into a ring, making the line customized.
    #[serde(default)]
    pub stone_id: Option<ProductId>,
}

const fn one() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// Reconciled lines with their totals and gate outcome.
#[derive(Debug, Clone)]
pub struct Quote {
    pub lines: Vec<CartLine>,
    pub totals: CartAggregationResult,
    pub gate: CheckoutGate,
}

/// A charge intent created for a quote.
#[derive(Debug, Clone)]
pub struct PendingPayment {
    pub intent: ChargeIntent,
    pub quote: Quote,
    /// Random reference stored on the intent; the caller keeps it with the
    /// cart and presents it again when placing the order.
    pub checkout_ref: String,
}

/// Customer details submitted with a paid order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub shipping_method: String,
    pub payment_intent_id: PaymentIntentId,
    /// Reference returned by [`CheckoutService::create_payment_intent`].
    pub checkout_ref: Option<String>,
    pub customer_email: Email,
    pub shipping_address: ShippingAddress,
}

/// Result of a successful order placement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_number: OrderNumber,
    pub totals: CartAggregationResult,
}

/// Prices, gates and charges carts against the collaborators.
#[derive(Clone)]
pub struct CheckoutService {
    catalog: Arc<dyn CatalogStore>,
    payments: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderWriter>,
    currency: CurrencyCode,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        payments: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderWriter>,
    ) -> Self {
        Self {
            catalog,
            payments,
            orders,
            currency: CurrencyCode::USD,
        }
    }

    /// Fetch a product, failing with `NotFound` if the catalog lacks it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product or the catalog error.
    pub async fn product(&self, id: &ProductId) -> Result<VariantCatalogEntry> {
        self.catalog
            .product_detail(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Resolve a new cart line for `request`.
    ///
    /// Missing karat/color fall back to the product's default metal. A metal
    /// that matches no option is priced at the base price and not recorded
    /// on the line.
    ///
    /// # Errors
    ///
    /// Fails for unknown products, unavailable sizes, or a stone on a
    /// non-ring product.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn build_line(&self, request: LineRequest) -> Result<CartLine> {
        let entry = self.product(&request.product_id).await?;

        let selection =
            PriceSelection::or_default_metal(&entry, request.karat, request.color, request.size);

        let mut line = CartLine::from_selection(&entry, &selection, request.quantity)?;

        if let Some(stone_id) = request.stone_id {
            if !entry.category.requires_size() {
                return Err(AppError::BadRequest(format!(
                    "{} cannot be customized with a stone",
                    entry.name
                )));
            }
            line.customization = Some(Customization {
                is_customized: true,
                component_prices: aurum_core::ComponentPrices {
                    setting: Decimal::ZERO,
                    stone: Decimal::ZERO,
                },
                stone_id: Some(stone_id),
            });
        }

        self.price_line(&entry, line).await
    }

    /// Re-resolve `line` against `entry`, updating price and breakdown.
    async fn price_line(&self, entry: &VariantCatalogEntry, mut line: CartLine) -> Result<CartLine> {
        let selection = line.selection();

        let stone_id = line
            .customization
            .as_ref()
            .filter(|c| c.is_customized)
            .and_then(|c| c.stone_id.clone());

        match (stone_id, line.customization.as_mut()) {
            (Some(stone_id), Some(customization)) => {
                let stone = self.product(&stone_id).await?;
                if !stone.category.is_stone() {
                    return Err(AppError::BadRequest(format!(
                        "{} is not a loose stone",
                        stone.name
                    )));
                }
                let components = resolve_customized_unit_price(entry, &selection, &stone)?;
                customization.component_prices = components;
                line.resolved_unit_price = components.total();
            }
            _ => {
                line.resolved_unit_price = resolve_sale_unit_price(entry, &selection)?;
            }
        }

        Ok(line)
    }

    /// Re-price a line after its ring size changed.
    ///
    /// # Errors
    ///
    /// Fails if the product is gone or the size is not available.
    pub async fn resize(&self, mut line: CartLine, size: RingSize) -> Result<CartLine> {
        let entry = self.product(&line.product_id).await?;
        line.size = Some(size);
        self.price_line(&entry, line).await
    }

    /// Re-resolve every line against the catalog.
    ///
    /// Client-side prices are never trusted: a line whose stored price
    /// differs from the catalog is corrected and the drift logged.
    ///
    /// # Errors
    ///
    /// Fails if a product was removed or a selection became unavailable.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn reconcile(&self, lines: &[CartLine]) -> Result<Vec<CartLine>> {
        let mut reconciled = Vec::with_capacity(lines.len());
        for line in lines {
            let entry = self.product(&line.product_id).await?;
            let mut priced = self.price_line(&entry, line.clone()).await?;
            priced.name.clone_from(&entry.name);
            priced.category = entry.category;

            if priced.resolved_unit_price != line.resolved_unit_price {
                tracing::warn!(
                    line_id = %line.id,
                    product_id = %line.product_id,
                    stored = %line.resolved_unit_price,
                    resolved = %priced.resolved_unit_price,
                    "Cart line price drifted from catalog; using catalog price"
                );
            }
            reconciled.push(priced);
        }
        Ok(reconciled)
    }

    /// Reconcile, gate and aggregate `lines`.
    ///
    /// A blocked gate is reported in the quote, not as an error.
    ///
    /// # Errors
    ///
    /// Fails on reconciliation errors or an unknown shipping method.
    pub async fn quote(&self, lines: &[CartLine], shipping_method: &str) -> Result<Quote> {
        let lines = self.reconcile(lines).await?;
        let gate = validate_for_checkout(&lines);
        let totals = aggregate(&lines, shipping_method)?;
        Ok(Quote {
            lines,
            totals,
            gate,
        })
    }

    /// Quote and require a non-empty, complete cart.
    async fn chargeable_quote(&self, lines: &[CartLine], shipping_method: &str) -> Result<Quote> {
        if lines.is_empty() {
            return Err(AppError::BadRequest("cart is empty".to_string()));
        }
        let quote = self.quote(lines, shipping_method).await?;
        quote.gate.clone().require_ready()?;
        Ok(quote)
    }

    /// Create a charge intent for the cart's rounded total.
    ///
    /// The intent carries a fresh checkout reference in its metadata so a
    /// later order can prove the intent was created for this checkout.
    ///
    /// # Errors
    ///
    /// Fails for an empty or incomplete cart, or on gateway errors.
    #[instrument(skip(self, lines))]
    pub async fn create_payment_intent(
        &self,
        lines: &[CartLine],
        shipping_method: &str,
    ) -> Result<PendingPayment> {
        let quote = self.chargeable_quote(lines, shipping_method).await?;
        let checkout_ref = Uuid::new_v4().simple().to_string();

        let mut metadata = ChargeMetadata::new();
        metadata.insert(CHECKOUT_REF_KEY.to_string(), checkout_ref.clone());
        metadata.insert(
            "shipping_method".to_string(),
            quote.totals.shipping_method.id().to_string(),
        );
        let item_count: u32 = quote
            .lines
            .iter()
            .map(|l| l.quantity.get())
            .fold(0, u32::saturating_add);
        metadata.insert("item_count".to_string(), item_count.to_string());

        let intent = self
            .payments
            .create_charge_intent(quote.totals.charge_amount(self.currency), &metadata)
            .await?;

        Ok(PendingPayment {
            intent,
            quote,
            checkout_ref,
        })
    }

    /// Verify the payment and write the order.
    ///
    /// The cart is re-quoted. The intent must carry this checkout's
    /// reference, have succeeded, and have charged exactly the quoted total
    /// in this currency. The order writer refuses a second order for the
    /// same intent.
    ///
    /// # Errors
    ///
    /// Returns `ForeignPayment`, `PaymentIncomplete` or `PaymentMismatch`
    /// when the intent does not cover the order, a 400 for a malformed
    /// intent ID, plus any quote or collaborator error.
    #[instrument(skip(self, lines, request), fields(payment_intent_id = %request.payment_intent_id))]
    pub async fn place_order(&self, lines: &[CartLine], request: PlaceOrder) -> Result<PlacedOrder> {
        if !request.payment_intent_id.is_well_formed() {
            let id = request.payment_intent_id.to_string();
            return Err(PaymentError::InvalidIntentId(id).into());
        }

        let quote = self
            .chargeable_quote(lines, &request.shipping_method)
            .await?;

        let intent = self
            .payments
            .retrieve_charge_intent(&request.payment_intent_id)
            .await?;
        let intent_ref = intent.metadata.get(CHECKOUT_REF_KEY);
        if request.checkout_ref.is_none() || intent_ref != request.checkout_ref.as_ref() {
            tracing::warn!(
                has_session_ref = request.checkout_ref.is_some(),
                has_intent_ref = intent_ref.is_some(),
                "Payment intent was not created for this checkout"
            );
            return Err(AppError::ForeignPayment(intent.id));
        }
        if !intent.status.is_paid() {
            return Err(AppError::PaymentIncomplete(intent.status));
        }

        let charge = quote.totals.charge_amount(self.currency);
        let expected_minor = charge
            .to_minor_units()
            .ok_or_else(|| AppError::Internal(format!("cannot charge {}", charge.amount)))?;
        if intent.amount_minor != expected_minor
            || !intent
                .currency
                .eq_ignore_ascii_case(self.currency.gateway_code())
        {
            return Err(AppError::PaymentMismatch {
                expected: charge.amount,
                actual: Decimal::new(intent.amount_minor, 2),
            });
        }

        let payload = OrderPayload::paid(
            &quote.lines,
            &quote.totals,
            request.customer_email,
            request.shipping_address,
            intent.id,
        );
        let order_number = self.orders.create_order(&payload).await?;
        tracing::info!(order_number = %order_number, total = %charge.amount, "Order placed");

        Ok(PlacedOrder {
            order_number,
            totals: quote.totals.rounded(),
        })
    }
}
