//! External collaborators of the checkout flow.
//!
//! The storefront prices and validates carts itself but depends on three
//! outside systems:
//!
//! - [`CatalogStore`] - reads product documents (metal and size options)
//! - [`PaymentGateway`] - creates and looks up charge intents
//! - [`OrderWriter`] - persists finalized orders
//!
//! # Adapters
//!
//! - [`BackendClient`] - catalog + orders over the store's HTTP backend,
//!   product details cached with `moka`
//! - [`LocalStore`] - catalog seeded from a YAML file, orders in memory
//! - [`StripeClient`] - payment intents on the card processor

mod backend;
mod local;
mod stripe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use aurum_core::{
    CatalogError, ChargeStatus, OrderNumber, OrderPayload, PaymentIntentId, Price, ProductId,
    VariantCatalogEntry,
};

pub use backend::BackendClient;
pub use local::LocalStore;
pub use stripe::StripeClient;

/// Errors from reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("catalog backend returned HTTP {0}")]
    Status(u16),

    /// Seed file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for a catalog.
    #[error("catalog file parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A product document breaks a catalog invariant.
    #[error("product {id} is invalid: {source}")]
    InvalidEntry {
        id: ProductId,
        #[source]
        source: CatalogError,
    },

    /// The configured base URL cannot carry path segments.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway rejected the request.
    #[error("payment gateway error (HTTP {status}): {message}")]
    Gateway { status: u16, message: String },

    /// The amount cannot be expressed in minor units.
    #[error("amount {0} cannot be charged")]
    InvalidAmount(String),

    /// The configured API base is not an absolute URL.
    #[error("invalid payment gateway URL: {0}")]
    InvalidBaseUrl(String),

    /// The intent ID is not a bare gateway token.
    #[error("malformed payment intent ID: {0:?}")]
    InvalidIntentId(String),
}

/// Errors from the order writer.
#[derive(Debug, Error)]
pub enum OrderWriteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend refused the order.
    #[error("order backend returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// An order already exists for this payment intent.
    #[error("payment intent {0} already has an order")]
    DuplicatePayment(PaymentIntentId),

    /// Backend accepted the request but returned no order number.
    #[error("order backend response missing order number")]
    MissingOrderNumber,

    /// The configured base URL cannot carry path segments.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// A charge intent as seen by the storefront.
#[derive(Debug, Clone)]
pub struct ChargeIntent {
    pub id: PaymentIntentId,
    /// Handed to the browser to confirm the payment; never logged.
    pub client_secret: SecretString,
    /// Amount in minor currency units (cents).
    pub amount_minor: i64,
    pub currency: String,
    pub status: ChargeStatus,
    /// Metadata stored on the intent when it was created.
    pub metadata: ChargeMetadata,
}

/// Key/value metadata attached to a charge intent.
pub type ChargeMetadata = BTreeMap<String, String>;

/// Metadata key holding the checkout reference an intent was created for.
pub const CHECKOUT_REF_KEY: &str = "checkout_ref";

/// Read access to product documents.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch a product's pricing document; `None` if it does not exist.
    async fn product_detail(
        &self,
        id: &ProductId,
    ) -> Result<Option<VariantCatalogEntry>, CatalogStoreError>;
}

/// Creates and inspects charge intents.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge intent for `amount`.
    async fn create_charge_intent(
        &self,
        amount: Price,
        metadata: &ChargeMetadata,
    ) -> Result<ChargeIntent, PaymentError>;

    /// Look up an existing charge intent.
    async fn retrieve_charge_intent(
        &self,
        id: &PaymentIntentId,
    ) -> Result<ChargeIntent, PaymentError>;
}

/// Persists finalized orders.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    /// Persist `order` and return its customer-facing number.
    ///
    /// Each payment intent pays for at most one order; a second order with
    /// the same `payment_intent_id` fails with
    /// [`OrderWriteError::DuplicatePayment`].
    async fn create_order(&self, order: &OrderPayload) -> Result<OrderNumber, OrderWriteError>;
}
