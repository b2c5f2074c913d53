//! Session-related types.
//!
//! The storefront keeps the cart and the reference of the last payment
//! intent created for it.

/// Session keys.
pub mod keys {
    /// Key for the customer's cart (`aurum_core::Cart`).
    pub const CART: &str = "cart";

    /// Key for the checkout reference stored on the latest payment intent.
    pub const CHECKOUT_REF: &str = "checkout_ref";
}
