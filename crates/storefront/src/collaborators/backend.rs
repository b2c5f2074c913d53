//! Catalog reads and order writes against the store's HTTP backend.
//!
//! Product details are cached with `moka` (TTL from `CATALOG_CACHE_TTL_SECS`)
//! so a busy product page does not hit the backend for every price lookup.
//! Only found products are cached; a 404 is re-checked on the next request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use aurum_core::{OrderNumber, OrderPayload, ProductId, VariantCatalogEntry};

use super::{CatalogStore, CatalogStoreError, OrderWriteError, OrderWriter};

/// Client for the catalog/order backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<ProductId, VariantCatalogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderResponse {
    order_number: Option<String>,
}

impl BackendClient {
    /// Create a client rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: Url, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url,
                cache,
            }),
        }
    }

    /// Build `{base}/{segments...}`, keeping any path prefix of the base.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| self.inner.base_url.to_string())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Drop a cached product, e.g. after an admin edit.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner.cache.invalidate(id).await;
    }

    /// Drop every cached product.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl CatalogStore for BackendClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product_detail(
        &self,
        id: &ProductId,
    ) -> Result<Option<VariantCatalogEntry>, CatalogStoreError> {
        if let Some(entry) = self.inner.cache.get(id).await {
            debug!("Cache hit for product");
            return Ok(Some(entry));
        }

        let url = self
            .endpoint(&["products", id.as_str()])
            .map_err(CatalogStoreError::InvalidUrl)?;
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Catalog backend returned non-success status");
            return Err(CatalogStoreError::Status(status.as_u16()));
        }

        let entry: VariantCatalogEntry = response.json().await?;
        entry
            .validate()
            .map_err(|source| CatalogStoreError::InvalidEntry {
                id: id.clone(),
                source,
            })?;

        self.inner.cache.insert(id.clone(), entry.clone()).await;
        Ok(Some(entry))
    }
}

#[async_trait]
impl OrderWriter for BackendClient {
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    async fn create_order(&self, order: &OrderPayload) -> Result<OrderNumber, OrderWriteError> {
        let url = self
            .endpoint(&["orders"])
            .map_err(OrderWriteError::InvalidUrl)?;

        let response = self.inner.client.post(url).json(order).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::CONFLICT {
            tracing::warn!(
                payment_intent_id = %order.payment_intent_id,
                "Order backend already holds an order for payment intent"
            );
            return Err(OrderWriteError::DuplicatePayment(
                order.payment_intent_id.clone(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Order backend rejected order"
            );
            return Err(OrderWriteError::Rejected {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let created: CreateOrderResponse = response.json().await?;
        created
            .order_number
            .filter(|n| !n.is_empty())
            .map(OrderNumber::new)
            .ok_or(OrderWriteError::MissingOrderNumber)
    }
}
