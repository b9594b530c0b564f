//! In-memory routing tables loaded from a TOML fixture file
//!
//! Used for local runs without the hosted backend and as the fake store in
//! tests. Inactive rows are dropped at load time, so lookups never see them.
//!
//! ```toml
//! [[parks]]
//! id = "..."
//! name = "Plose"
//!
//! [[prefixes]]
//! path_prefix = "plose-plosebob"
//! park_id = "..."
//!
//! [[cameras]]
//! park_id = "..."
//! customer_code = "2201"
//! attraction_id = "..."
//!
//! [[attractions]]
//! id = "..."
//! park_id = "..."
//! name = "Alpine Coaster"
//! ```

use crate::domain::types::{
    Attraction, AttractionId, CameraMapping, CameraRoute, Park, ParkId, ParkPrefix, PrefixRoute,
};
use crate::domain::validation::{is_customer_code, normalize_prefix};
use crate::services::store::{LookupError, RoutingStore};
use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("prefix for park {0} is empty")]
    EmptyPrefix(ParkId),

    #[error("prefix {0:?} is active for more than one row")]
    DuplicatePrefix(String),

    #[error("customer code {code:?} for park {park_id} must be exactly 4 digits")]
    InvalidCustomerCode { park_id: ParkId, code: String },

    #[error("customer code {code} is mapped twice in park {park_id}")]
    DuplicateCamera { park_id: ParkId, code: String },
}

/// Raw fixture tables as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureTables {
    #[serde(default)]
    pub parks: Vec<Park>,
    #[serde(default)]
    pub prefixes: Vec<ParkPrefix>,
    #[serde(default)]
    pub cameras: Vec<CameraMapping>,
    #[serde(default)]
    pub attractions: Vec<Attraction>,
}

impl FixtureTables {
    pub fn with_park(mut self, id: ParkId, name: &str) -> Self {
        self.parks.push(Park { id, name: name.to_string(), slug: None, is_active: true });
        self
    }

    pub fn with_prefix(mut self, path_prefix: &str, park_id: ParkId, is_active: bool) -> Self {
        self.prefixes.push(ParkPrefix { path_prefix: path_prefix.to_string(), park_id, is_active });
        self
    }

    pub fn with_camera(
        mut self,
        park_id: ParkId,
        customer_code: &str,
        attraction_id: Option<AttractionId>,
        is_active: bool,
    ) -> Self {
        self.cameras.push(CameraMapping {
            park_id,
            customer_code: customer_code.to_string(),
            camera_name: None,
            attraction_id,
            is_active,
        });
        self
    }

    pub fn with_attraction(mut self, id: AttractionId, park_id: ParkId, name: &str) -> Self {
        self.attractions.push(Attraction { id, park_id, name: name.to_string() });
        self
    }
}

/// Read-only routing store over validated in-memory tables
#[derive(Debug, Default)]
pub struct FixtureStore {
    park_names: FxHashMap<ParkId, String>,
    /// Active prefixes only
    prefixes: FxHashMap<String, ParkId>,
    /// Active camera mappings only
    cameras: FxHashMap<(ParkId, String), Option<AttractionId>>,
    attractions: FxHashMap<AttractionId, Attraction>,
}

impl FixtureStore {
    /// Load and validate a TOML fixture file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| FixtureError::Read { path: path.display().to_string(), source })?;
        let tables: FixtureTables = toml::from_str(&content)
            .map_err(|source| FixtureError::Parse { path: path.display().to_string(), source })?;

        let store = Self::from_tables(tables)?;
        info!(
            path = %path.display(),
            parks = %store.park_names.len(),
            prefixes = %store.prefixes.len(),
            cameras = %store.cameras.len(),
            attractions = %store.attractions.len(),
            "fixture_store_loaded"
        );
        Ok(store)
    }

    /// Validate tables and index the active rows
    pub fn from_tables(tables: FixtureTables) -> Result<Self, FixtureError> {
        let mut store = Self::default();

        for park in tables.parks {
            store.park_names.insert(park.id, park.name);
        }

        for row in tables.prefixes {
            let prefix =
                normalize_prefix(&row.path_prefix).ok_or(FixtureError::EmptyPrefix(row.park_id))?;
            if !row.is_active {
                continue;
            }
            if store.prefixes.insert(prefix.to_string(), row.park_id).is_some() {
                return Err(FixtureError::DuplicatePrefix(prefix.to_string()));
            }
        }

        let mut seen_cameras: FxHashSet<(ParkId, String)> = FxHashSet::default();
        for row in tables.cameras {
            if !is_customer_code(&row.customer_code) {
                return Err(FixtureError::InvalidCustomerCode {
                    park_id: row.park_id,
                    code: row.customer_code,
                });
            }
            let key = (row.park_id, row.customer_code);
            if !seen_cameras.insert(key.clone()) {
                return Err(FixtureError::DuplicateCamera { park_id: key.0, code: key.1 });
            }
            if row.is_active {
                store.cameras.insert(key, row.attraction_id);
            }
        }

        for attraction in tables.attractions {
            store.attractions.insert(attraction.id, attraction);
        }

        Ok(store)
    }
}

#[async_trait]
impl RoutingStore for FixtureStore {
    async fn find_active_prefix(
        &self,
        path_prefix: &str,
    ) -> Result<Option<PrefixRoute>, LookupError> {
        Ok(self.prefixes.get(path_prefix).map(|&park_id| PrefixRoute {
            park_id,
            park_name: self.park_names.get(&park_id).cloned(),
        }))
    }

    async fn find_active_camera(
        &self,
        park_id: ParkId,
        customer_code: &str,
    ) -> Result<Option<CameraRoute>, LookupError> {
        Ok(self
            .cameras
            .get(&(park_id, customer_code.to_string()))
            .map(|&attraction_id| CameraRoute { attraction_id }))
    }

    async fn find_attraction(
        &self,
        attraction_id: AttractionId,
    ) -> Result<Option<Attraction>, LookupError> {
        Ok(self.attractions.get(&attraction_id).cloned())
    }
}
