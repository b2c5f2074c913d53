//! Aurum Storefront - jewelry cart, pricing and checkout service.
//!
//! This binary serves the storefront JSON API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - Cart held in a tower-sessions session (in-memory store)
//! - Prices resolved by `aurum-core` from catalog product documents
//! - Catalog from the store backend (`CATALOG_API_URL`) or a YAML seed file
//! - Charge intents created and verified on the payment gateway
//!
//! # Security
//!
//! The payment secret key is only ever sent to the payment gateway. Client
//! prices are never trusted: every checkout step re-prices the cart.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use aurum_storefront::collaborators::{
    BackendClient, CatalogStore, LocalStore, OrderWriter, PaymentGateway, StripeClient,
};
use aurum_storefront::config::{CatalogSource, StorefrontConfig};
use aurum_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Build the catalog reader and order writer for the configured source.
async fn build_collaborators(
    source: &CatalogSource,
) -> (Arc<dyn CatalogStore>, Arc<dyn OrderWriter>) {
    match source {
        CatalogSource::Backend { api_url, cache_ttl } => {
            tracing::info!(api_url = %api_url, "Using catalog backend");
            let client = BackendClient::new(api_url.clone(), *cache_ttl);
            (Arc::new(client.clone()), Arc::new(client))
        }
        CatalogSource::LocalFile { path } => {
            let store = LocalStore::from_yaml_file(path)
                .await
                .expect("Failed to load catalog file");
            tracing::warn!("No CATALOG_API_URL set; orders are kept in memory only");
            (Arc::new(store.clone()), Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aurum_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let (catalog, orders) = build_collaborators(&config.catalog).await;
    let payments: Arc<dyn PaymentGateway> = Arc::new(
        StripeClient::new(&config.payments).expect("Invalid STRIPE_API_BASE"),
    );

    let state = AppState::new(config.clone(), catalog, payments, orders);

    let app = aurum_storefront::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
