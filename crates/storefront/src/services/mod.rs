//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Line pricing, cart reconciliation, quotes, payment intents
//!   and order placement

pub mod checkout;

pub use checkout::{
    CheckoutService, LineRequest, PendingPayment, PlaceOrder, PlacedOrder, Quote,
};
