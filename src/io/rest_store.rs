//! Routing store backed by the hosted database's REST API (PostgREST dialect)
//!
//! Every lookup is a filtered `GET /rest/v1/<table>` authenticated with the
//! service key. Payloads are decoded into typed rows here; anything that
//! does not decode is a `LookupError::Decode`, never "not found".

use crate::domain::types::{Attraction, AttractionId, CameraRoute, ParkId, PrefixRoute};
use crate::services::store::{LookupError, RoutingStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error};

const TABLE_PREFIXES: &str = "park_path_prefixes";
const TABLE_CAMERAS: &str = "park_cameras";
const TABLE_ATTRACTIONS: &str = "attractions";

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub base_url: String,
    pub service_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PrefixRow {
    park_id: ParkId,
    #[serde(default)]
    parks: Option<ParkNameRow>,
}

#[derive(Debug, Deserialize)]
struct ParkNameRow {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CameraRow {
    #[serde(default)]
    attraction_id: Option<AttractionId>,
}

#[derive(Debug, Deserialize)]
struct AttractionRow {
    id: AttractionId,
    park_id: ParkId,
    #[serde(default)]
    name: Option<String>,
}

pub struct RestStore {
    client: reqwest::Client,
    rest_url: String,
    service_key: String,
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, LookupError> {
        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            rest_url: rest_url(&config.base_url),
            service_key: config.service_key,
        })
    }

    /// Run a filtered select and return at most one decoded row
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, LookupError> {
        let start = Instant::now();
        let url = format!("{}/{}", self.rest_url, table);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(table = %table, error = %e, "rest_request_failed");
                LookupError::Transport { table, message: e.to_string() }
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::Transport { table, message: e.to_string() })?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let body: String = text.chars().take(MAX_ERROR_BODY).collect();
            error!(table = %table, status = %status.as_u16(), "rest_request_rejected");
            return Err(LookupError::Status { table, status: status.as_u16(), body });
        }

        let row = decode_single::<T>(table, &body)?;
        debug!(
            table = %table,
            found = %row.is_some(),
            latency_us = %start.elapsed().as_micros(),
            "rest_lookup"
        );
        Ok(row)
    }
}

/// Normalize a project URL to its REST root
fn rest_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/rest/v1") {
        base.to_string()
    } else {
        format!("{}/rest/v1", base)
    }
}

/// Decode a PostgREST array response that must hold zero or one row
fn decode_single<T: DeserializeOwned>(
    table: &'static str,
    body: &[u8],
) -> Result<Option<T>, LookupError> {
    let mut rows: Vec<T> = serde_json::from_slice(body)
        .map_err(|e| LookupError::Decode { table, message: e.to_string() })?;

    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(LookupError::Ambiguous { table, rows: n }),
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl RoutingStore for RestStore {
    async fn find_active_prefix(
        &self,
        path_prefix: &str,
    ) -> Result<Option<PrefixRoute>, LookupError> {
        let query = [
            ("select", "park_id,parks(name)".to_string()),
            ("path_prefix", eq(path_prefix)),
            ("is_active", eq(true)),
        ];
        let row: Option<PrefixRow> = self.select_one(TABLE_PREFIXES, &query).await?;
        Ok(row.map(|row| PrefixRoute {
            park_id: row.park_id,
            park_name: row.parks.and_then(|p| p.name),
        }))
    }

    async fn find_active_camera(
        &self,
        park_id: ParkId,
        customer_code: &str,
    ) -> Result<Option<CameraRoute>, LookupError> {
        let query = [
            ("select", "attraction_id".to_string()),
            ("park_id", eq(park_id)),
            ("customer_code", eq(customer_code)),
            ("is_active", eq(true)),
        ];
        let row: Option<CameraRow> = self.select_one(TABLE_CAMERAS, &query).await?;
        Ok(row.map(|row| CameraRoute { attraction_id: row.attraction_id }))
    }

    async fn find_attraction(
        &self,
        attraction_id: AttractionId,
    ) -> Result<Option<Attraction>, LookupError> {
        let query = [("select", "id,park_id,name".to_string()), ("id", eq(attraction_id))];
        let row: Option<AttractionRow> = self.select_one(TABLE_ATTRACTIONS, &query).await?;
        // A null name keeps the match; the resolver reports it as no name
        Ok(row.map(|row| Attraction {
            id: row.id,
            park_id: row.park_id,
            name: row.name.unwrap_or_default(),
        }))
    }
}
