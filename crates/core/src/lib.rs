//! Aurum Core - jewelry pricing and checkout domain library.
//!
//! This crate holds everything the storefront and the back-office CLI agree
//! on when it comes to money:
//! - `storefront` - JSON storefront service (cart, quotes, payment, orders)
//! - `cli` - Catalog maintenance and offline quotes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Every price a customer sees or pays is
//! derived here from a [`VariantCatalogEntry`] and an explicit
//! [`PriceSelection`].
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails and statuses
//! - [`catalog`] - Catalog entries, metal/size options and admin list helpers
//! - [`pricing`] - Unit price resolution (metal, size, sale, customization)
//! - [`cart`] - Cart lines and the session cart
//! - [`shipping`] - Fixed shipping tiers
//! - [`checkout`] - Cart aggregation and the pre-checkout gate
//! - [`order`] - Order payloads handed to the order writer
//! - [`error`] - Error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod order;
pub mod pricing;
pub mod shipping;
pub mod types;

pub use cart::{Cart, CartLine, ComponentPrices, Customization, MetalSelection};
pub use catalog::{MetalOption, ProductCategory, RingSize, SizeOption, VariantCatalogEntry};
pub use checkout::{CartAggregationResult, CheckoutGate, TAX_RATE, aggregate, validate_for_checkout};
pub use error::{CartError, CatalogError, PricingError};
pub use order::{OrderItem, OrderPayload, OrderPricing, ShippingAddress};
pub use pricing::{PriceSelection, resolve_unit_price};
pub use shipping::ShippingMethod;
pub use types::*;
