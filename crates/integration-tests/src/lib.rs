//! Integration test harness for the Aurum storefront.
//!
//! Tests drive the real router with `tower::ServiceExt::oneshot`. The catalog
//! and order sink are a [`LocalStore`] seeded from `data/catalog.yaml`; the
//! payment gateway is a [`FakeGateway`] whose reported status the test
//! controls.
//!
//! ```rust,ignore
//! let mut ctx = TestContext::new();
//! let (status, body) = ctx.post("/cart/items", json!({"productId": "bracelet-tennis"})).await;
//! assert_eq!(status, StatusCode::CREATED);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use aurum_core::{ChargeStatus, PaymentIntentId, Price};
use aurum_storefront::collaborators::{
    ChargeIntent, ChargeMetadata, LocalStore, PaymentError, PaymentGateway,
};
use aurum_storefront::config::{CatalogSource, PaymentConfig, StorefrontConfig};
use aurum_storefront::state::AppState;

/// Catalog seed shared with the storefront's local mode.
pub const CATALOG_YAML: &str = include_str!("../../../data/catalog.yaml");

/// Payment gateway double.
///
/// Remembers the last charged amount and metadata and reports them back on
/// retrieval, with whatever status the test has set.
#[derive(Debug)]
pub struct FakeGateway {
    status: Mutex<ChargeStatus>,
    charged_minor: Mutex<Option<i64>>,
    created: Mutex<Vec<ChargeMetadata>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            status: Mutex::new(ChargeStatus::RequiresPaymentMethod),
            charged_minor: Mutex::new(None),
            created: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGateway {
    /// Status reported for every retrieved intent from now on.
    pub fn set_status(&self, status: ChargeStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Amount of the most recent intent, in cents.
    pub fn charged_minor(&self) -> Option<i64> {
        *self
            .charged_minor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Metadata of every intent created so far.
    pub fn created(&self) -> Vec<ChargeMetadata> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_charge_intent(
        &self,
        amount: Price,
        metadata: &ChargeMetadata,
    ) -> Result<ChargeIntent, PaymentError> {
        let minor = amount
            .to_minor_units()
            .ok_or_else(|| PaymentError::InvalidAmount(amount.amount.to_string()))?;
        *self
            .charged_minor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(minor);
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(metadata.clone());

        Ok(ChargeIntent {
            id: PaymentIntentId::new("pi_integration"),
            client_secret: SecretString::from("pi_integration_secret"),
            amount_minor: minor,
            currency: "usd".to_string(),
            status: ChargeStatus::RequiresPaymentMethod,
            metadata: metadata.clone(),
        })
    }

    async fn retrieve_charge_intent(
        &self,
        id: &PaymentIntentId,
    ) -> Result<ChargeIntent, PaymentError> {
        Ok(ChargeIntent {
            id: id.clone(),
            client_secret: SecretString::from("pi_integration_secret"),
            amount_minor: self.charged_minor().unwrap_or(0),
            currency: "usd".to_string(),
            status: *self.status.lock().unwrap_or_else(PoisonError::into_inner),
            metadata: self.created().pop().unwrap_or_default(),
        })
    }
}

/// Storefront configuration for tests: plain HTTP, local catalog.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        payments: PaymentConfig {
            api_base: "http://payments.invalid".to_string(),
            secret_key: SecretString::from("sk_test_integration"),
        },
        catalog: CatalogSource::LocalFile {
            path: "data/catalog.yaml".into(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A storefront router plus handles on its collaborators.
///
/// Keeps the session cookie between requests, like a browser would.
pub struct TestContext {
    pub app: Router,
    pub store: LocalStore,
    pub gateway: Arc<FakeGateway>,
    cookie: Option<String>,
}

impl TestContext {
    /// Build a storefront over the seeded catalog.
    ///
    /// # Panics
    ///
    /// Panics if the seed catalog is invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let store = LocalStore::from_yaml_str(CATALOG_YAML).expect("seed catalog is valid");
        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::new(
            test_config(),
            Arc::new(store.clone()),
            gateway.clone(),
            Arc::new(store.clone()),
        );

        Self {
            app: aurum_storefront::app(state),
            store,
            gateway,
            cookie: None,
        }
    }

    /// Forget the session cookie (a new visitor).
    pub fn clear_session(&mut self) {
        self.cookie = None;
    }

    /// Send a request and return the status and JSON body (`Null` if empty).
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    #[allow(clippy::expect_used)]
    pub async fn request(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE)
            && let Ok(value) = set_cookie.to_str()
            && let Some(pair) = value.split(';').next()
        {
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a decimal that the API serialized as a string.
///
/// # Panics
///
/// Panics if `value` is not a decimal string.
#[must_use]
#[allow(clippy::expect_used)]
pub fn dec(value: &Value) -> Decimal {
    let s = value.as_str().expect("decimal serialized as string");
    Decimal::from_str(s).expect("valid decimal")
}
