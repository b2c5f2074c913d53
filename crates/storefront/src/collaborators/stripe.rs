//! Payment intents on the card processor's REST API.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Amounts cross this boundary in minor units only.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use aurum_core::{ChargeStatus, PaymentIntentId, Price};

use super::{ChargeIntent, ChargeMetadata, PaymentError, PaymentGateway};
use crate::config::PaymentConfig;

/// Payment gateway client.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: Url,
    secret_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: ChargeStatus,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl From<PaymentIntentResponse> for ChargeIntent {
    fn from(r: PaymentIntentResponse) -> Self {
        Self {
            id: PaymentIntentId::new(r.id),
            client_secret: SecretString::from(r.client_secret.unwrap_or_default()),
            amount_minor: r.amount,
            currency: r.currency,
            status: r.status,
            metadata: r.metadata,
        }
    }
}

impl StripeClient {
    /// Create a client for the configured API base.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidBaseUrl`] if the base is not an
    /// absolute URL that can carry path segments.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let api_base = Url::parse(&config.api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| PaymentError::InvalidBaseUrl(config.api_base.clone()))?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_base,
                secret_key: config.secret_key.clone(),
            }),
        })
    }

    /// Build `{base}/v1/{segments...}`; each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    /// URL of a single intent; only bare gateway tokens are accepted.
    fn intent_url(&self, id: &PaymentIntentId) -> Result<Url, PaymentError> {
        if !id.is_well_formed() {
            return Err(PaymentError::InvalidIntentId(id.to_string()));
        }
        Ok(self.url(&["payment_intents", id.as_str()]))
    }

    async fn parse(response: reqwest::Response) -> Result<ChargeIntent, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| text.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "Payment gateway error");
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntentResponse = response.json().await?;
        Ok(intent.into())
    }
}

/// Form fields for a new payment intent.
fn intent_form(amount_minor: i64, currency: &str, metadata: &ChargeMetadata) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), amount_minor.to_string()),
        ("currency".to_string(), currency.to_string()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    form.extend(
        metadata
            .iter()
            .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
    );
    form
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self, metadata), fields(amount = %amount.amount))]
    async fn create_charge_intent(
        &self,
        amount: Price,
        metadata: &ChargeMetadata,
    ) -> Result<ChargeIntent, PaymentError> {
        let amount_minor = amount
            .to_minor_units()
            .filter(|cents| *cents > 0)
            .ok_or_else(|| PaymentError::InvalidAmount(amount.amount.to_string()))?;

        let form = intent_form(
            amount_minor,
            amount.currency_code.gateway_code(),
            metadata,
        );

        let response = self
            .inner
            .client
            .post(self.url(&["payment_intents"]))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let intent = Self::parse(response).await?;
        tracing::info!(payment_intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    #[instrument(skip(self), fields(payment_intent_id = %id))]
    async fn retrieve_charge_intent(
        &self,
        id: &PaymentIntentId,
    ) -> Result<ChargeIntent, PaymentError> {
        let url = self.intent_url(id)?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;

        Self::parse(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_form_fields() {
        let mut metadata = ChargeMetadata::new();
        metadata.insert("item_count".into(), "3".into());
        let form = intent_form(89_619, "usd", &metadata);

        assert!(form.contains(&("amount".into(), "89619".into())));
        assert!(form.contains(&("currency".into(), "usd".into())));
        assert!(form.contains(&("metadata[item_count]".into(), "3".into())));
    }

    fn client(api_base: &str) -> StripeClient {
        StripeClient::new(&PaymentConfig {
            api_base: api_base.into(),
            secret_key: SecretString::from("sk_test_key"),
        })
        .unwrap()
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = client("http://localhost:12111/");
        assert_eq!(
            client.url(&["payment_intents"]).as_str(),
            "http://localhost:12111/v1/payment_intents"
        );
    }

    #[test]
    fn test_intent_url_for_gateway_token() {
        let client = client("https://api.stripe.com");
        let url = client
            .intent_url(&PaymentIntentId::new("pi_3NqL7hK2aB9xYz3Q"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.stripe.com/v1/payment_intents/pi_3NqL7hK2aB9xYz3Q"
        );
    }

    #[test]
    fn test_intent_url_rejects_path_and_query_characters() {
        let client = client("https://api.stripe.com");
        for id in ["../customers?limit=1", "pi_1/cancel", "pi_1#x", ""] {
            let err = client.intent_url(&PaymentIntentId::new(id)).unwrap_err();
            assert!(matches!(err, PaymentError::InvalidIntentId(_)), "{id}");
        }
    }

    #[tokio::test]
    async fn test_retrieve_rejects_malformed_id_before_sending() {
        // Nothing listens on this base; a request would fail with `Http`.
        let client = client("http://127.0.0.1:9");
        let err = client
            .retrieve_charge_intent(&PaymentIntentId::new("../customers?limit=1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidIntentId(_)));
    }

    #[test]
    fn test_base_url_must_be_absolute() {
        let err = StripeClient::new(&PaymentConfig {
            api_base: "not a url".into(),
            secret_key: SecretString::from("sk_test_key"),
        })
        .err()
        .unwrap();
        assert!(matches!(err, PaymentError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_response_maps_to_charge_intent() {
        let json = r#"{
            "id": "pi_3Nq",
            "object": "payment_intent",
            "client_secret": "pi_3Nq_secret_abc",
            "amount": 11399,
            "currency": "usd",
            "status": "requires_payment_method",
            "metadata": {"checkout_ref": "c0ffee", "item_count": "2"}
        }"#;
        let intent: ChargeIntent = serde_json::from_str::<PaymentIntentResponse>(json)
            .unwrap()
            .into();
        assert_eq!(intent.id.as_str(), "pi_3Nq");
        assert_eq!(intent.amount_minor, 11_399);
        assert_eq!(intent.status, ChargeStatus::RequiresPaymentMethod);
        assert_eq!(intent.client_secret.expose_secret(), "pi_3Nq_secret_abc");
        assert_eq!(intent.metadata["checkout_ref"], "c0ffee");
    }
}
