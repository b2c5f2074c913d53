//! In-process catalog and order store.
//!
//! Used when no catalog backend is configured: products are loaded once from
//! a YAML seed file and orders are kept in memory for the life of the process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use aurum_core::{OrderNumber, OrderPayload, ProductId, VariantCatalogEntry};

use super::{CatalogStore, CatalogStoreError, OrderWriteError, OrderWriter};

const ORDER_PREFIX: &str = "AUR";
const ORDER_SUFFIX_LEN: usize = 6;

/// Catalog seeded from a file, with an in-memory order log.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<LocalStoreInner>,
}

#[derive(Default)]
struct LocalStoreInner {
    products: RwLock<HashMap<ProductId, VariantCatalogEntry>>,
    orders: Mutex<Vec<(OrderNumber, OrderPayload)>>,
}

impl LocalStore {
    /// Build a store from already-parsed entries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogStoreError::InvalidEntry`] for the first entry that
    /// fails validation.
    pub fn from_entries(
        entries: impl IntoIterator<Item = VariantCatalogEntry>,
    ) -> Result<Self, CatalogStoreError> {
        let mut products = HashMap::new();
        for entry in entries {
            entry
                .validate()
                .map_err(|source| CatalogStoreError::InvalidEntry {
                    id: entry.id.clone(),
                    source,
                })?;
            products.insert(entry.id.clone(), entry);
        }

        Ok(Self {
            inner: Arc::new(LocalStoreInner {
                products: RwLock::new(products),
                orders: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Parse a YAML list of catalog entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or an entry is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogStoreError> {
        let entries: Vec<VariantCatalogEntry> = serde_yaml::from_str(yaml)?;
        Self::from_entries(entries)
    }

    /// Load the catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_yaml_file(path: &Path) -> Result<Self, CatalogStoreError> {
        let yaml = tokio::fs::read_to_string(path).await?;
        let store = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.display(),
            products = store.product_count().await,
            "Catalog loaded from file"
        );
        Ok(store)
    }

    /// Insert or replace a product.
    pub async fn upsert_product(&self, entry: VariantCatalogEntry) {
        self.inner
            .products
            .write()
            .await
            .insert(entry.id.clone(), entry);
    }

    pub async fn product_count(&self) -> usize {
        self.inner.products.read().await.len()
    }

    /// Orders written so far, oldest first.
    pub async fn orders(&self) -> Vec<(OrderNumber, OrderPayload)> {
        self.inner.orders.lock().await.clone()
    }
}

/// `AUR-YYYYMMDD-XXXXXX` with an uppercase alphanumeric suffix.
fn generate_order_number() -> OrderNumber {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    OrderNumber::new(format!(
        "{ORDER_PREFIX}-{}-{suffix}",
        Utc::now().format("%Y%m%d")
    ))
}

#[async_trait]
impl CatalogStore for LocalStore {
    async fn product_detail(
        &self,
        id: &ProductId,
    ) -> Result<Option<VariantCatalogEntry>, CatalogStoreError> {
        Ok(self.inner.products.read().await.get(id).cloned())
    }
}

#[async_trait]
impl OrderWriter for LocalStore {
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    async fn create_order(&self, order: &OrderPayload) -> Result<OrderNumber, OrderWriteError> {
        let mut orders = self.inner.orders.lock().await;
        if orders
            .iter()
            .any(|(_, placed)| placed.payment_intent_id == order.payment_intent_id)
        {
            tracing::warn!(
                payment_intent_id = %order.payment_intent_id,
                "Order already recorded for payment intent"
            );
            return Err(OrderWriteError::DuplicatePayment(
                order.payment_intent_id.clone(),
            ));
        }

        let number = generate_order_number();
        orders.push((number.clone(), order.clone()));
        tracing::info!(order_number = %number, "Order recorded");
        Ok(number)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const CATALOG: &str = r#"
- id: ring-1
  name: Classic Solitaire
  category: ring
  basePrice: "500"
  metalOptions:
    - karat: 14K
      color: White Gold
      price: "550"
      isDefault: true
  sizeOptions:
    - size: "7.0"
      additionalPrice: "25"
- id: pendant-1
  name: Halo Pendant
  category: necklace
  basePrice: 320.50
"#;

    #[tokio::test]
    async fn test_yaml_catalog_lookup() {
        let store = LocalStore::from_yaml_str(CATALOG).unwrap();
        assert_eq!(store.product_count().await, 2);

        let ring = store
            .product_detail(&ProductId::new("ring-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ring.metal_options.len(), 1);
        assert!(ring.size_options[0].is_available);

        let pendant = store
            .product_detail(&ProductId::new("pendant-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pendant.base_price, Decimal::new(32050, 2));

        assert!(
            store
                .product_detail(&ProductId::new("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_invalid_entry_rejected() {
        let yaml = r#"
- id: ring-2
  name: Two Defaults
  category: ring
  basePrice: "100"
  metalOptions:
    - { karat: 14K, color: Yellow Gold, price: "100", isDefault: true }
    - { karat: 18K, color: Yellow Gold, price: "150", isDefault: true }
"#;
        let err = LocalStore::from_yaml_str(yaml).err().unwrap();
        assert!(matches!(err, CatalogStoreError::InvalidEntry { .. }));
    }

    fn paid_order(intent: &str) -> OrderPayload {
        let line = aurum_core::CartLine::new(
            "pendant-1",
            aurum_core::ProductCategory::Necklace,
            Decimal::new(100, 0),
            std::num::NonZeroU32::MIN,
        );
        let lines = [line];
        let totals = aurum_core::aggregate(&lines, "standard").unwrap();
        OrderPayload::paid(
            &lines,
            &totals,
            aurum_core::Email::parse("buyer@example.com").unwrap(),
            aurum_core::ShippingAddress {
                full_name: "Ana Buyer".into(),
                line1: "1 Main St".into(),
                line2: None,
                city: "Springfield".into(),
                state: "IL".into(),
                postal_code: "62701".into(),
                country: "US".into(),
            },
            aurum_core::PaymentIntentId::new(intent),
        )
    }

    #[tokio::test]
    async fn test_second_order_for_same_intent_rejected() {
        let store = LocalStore::default();
        store.create_order(&paid_order("pi_1")).await.unwrap();

        let err = store.create_order(&paid_order("pi_1")).await.unwrap_err();
        assert!(
            matches!(err, OrderWriteError::DuplicatePayment(ref id) if id.as_str() == "pi_1")
        );

        store.create_order(&paid_order("pi_2")).await.unwrap();
        assert_eq!(store.orders().await.len(), 2);
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "AUR");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), ORDER_SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }
}
