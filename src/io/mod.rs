//! IO modules - external system interfaces
//!
//! - `fixture_store` - in-memory routing tables from a TOML fixture file
//! - `rest_store` - routing tables over the hosted database REST API
//! - `http` - admin HTTP endpoint (preview-parse, metrics, health)

pub mod fixture_store;
pub mod http;
pub mod rest_store;

// Re-export commonly used types
pub use fixture_store::{FixtureError, FixtureStore, FixtureTables};
pub use http::start_http_server;
pub use rest_store::{RestStore, RestStoreConfig};

use crate::infra::config::{Config, StoreBackend};
use crate::services::store::RoutingStore;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Build the routing store selected by the configuration
pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RoutingStore>> {
    match config.store_backend() {
        StoreBackend::Fixture => {
            let store = FixtureStore::from_file(config.fixture_file())
                .with_context(|| format!("Failed to load fixtures from {}", config.fixture_file()))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Rest => {
            let (base_url, service_key) = config.rest_credentials()?;
            let store = RestStore::new(RestStoreConfig {
                base_url: base_url.to_string(),
                service_key: service_key.to_string(),
                timeout: Duration::from_millis(config.store_timeout_ms()),
            })
            .context("Failed to build REST client")?;
            Ok(Arc::new(store))
        }
    }
}
