//! Path resolver - turns parsed path tokens into park/camera/attraction matches
//!
//! Resolution is a linear pipeline with early exits:
//! 1. prefix -> park (no park means nothing else resolves)
//! 2. ordered, de-duplicated customer code candidates (primary, legacy)
//! 3. first candidate with an active camera mapping that has an attraction
//! 4. attraction display name
//!
//! Each stage waits on the previous one. Lookup failures abort the pipeline
//! and are reported as `ResolveError`; an unmatched stage is not an error.

use crate::domain::filename::{parse_filename, ParsedPath};
use crate::domain::types::{AttractionId, CameraRoute, Resolution};
use crate::infra::metrics::Metrics;
use crate::services::store::{LookupError, RoutingStore};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};


/// A routing lookup failed; resolution was aborted at `stage`
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("prefix lookup failed: {0}")]
    Prefix(#[source] LookupError),

    #[error("camera lookup for code {code} failed: {source}")]
    Camera {
        code: String,
        #[source]
        source: LookupError,
    },

    #[error("attraction lookup failed: {0}")]
    Attraction(#[source] LookupError),
}

impl ResolveError {
    pub fn stage(&self) -> &'static str {
        match self {
            ResolveError::Prefix(_) => "prefix",
            ResolveError::Camera { .. } => "camera",
            ResolveError::Attraction(_) => "attraction",
        }
    }

    pub fn lookup_error(&self) -> &LookupError {
        match self {
            ResolveError::Prefix(e) | ResolveError::Attraction(e) => e,
            ResolveError::Camera { source, .. } => source,
        }
    }
}

/// Parsed tokens and resolution flattened into one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathPreview {
    #[serde(flatten)]
    pub parsed: ParsedPath,
    #[serde(flatten)]
    pub resolution: Resolution,
}

/// Customer codes to try, in order: primary first, then legacy.
/// Absent values and repeats are dropped.
pub fn customer_code_candidates(parsed: &ParsedPath) -> SmallVec<[&str; 2]> {
    let mut candidates: SmallVec<[&str; 2]> = SmallVec::new();
    for code in [parsed.customer_code.as_deref(), parsed.legacy_customer_code.as_deref()]
        .into_iter()
        .flatten()
    {
        if !code.is_empty() && !candidates.contains(&code) {
            candidates.push(code);
        }
    }
    candidates
}

/// A camera lookup only ends the candidate search when the mapping carries an attraction
#[inline]
pub fn accepted_attraction(route: Option<CameraRoute>) -> Option<AttractionId> {
    route.and_then(|r| r.attraction_id)
}

/// Resolves parsed paths against an injected routing store
pub struct PathResolver {
    store: Arc<dyn RoutingStore>,
    metrics: Arc<Metrics>,
}

impl PathResolver {
    pub fn new(store: Arc<dyn RoutingStore>) -> Self {
        Self::with_metrics(store, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(store: Arc<dyn RoutingStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Parse `path` and resolve it; the boundary operation behind preview-parse
    pub async fn preview(&self, path: &str) -> Result<PathPreview, ResolveError> {
        let start = Instant::now();
        let parsed = parse_filename(path);

        match self.resolve(&parsed).await {
            Ok(resolution) => {
                let latency_us = start.elapsed().as_micros() as u64;
                self.metrics.record_preview(latency_us, &resolution);
                debug!(
                    path = %path,
                    park_id = ?resolution.matched_park_id,
                    customer_code = ?resolution.matched_customer_code,
                    attraction_id = ?resolution.matched_attraction_id,
                    latency_us = %latency_us,
                    "preview_resolved"
                );
                Ok(PathPreview { parsed, resolution })
            }
            Err(e) => {
                self.metrics.record_lookup_failure();
                warn!(path = %path, stage = %e.stage(), error = %e, "preview_lookup_failed");
                Err(e)
            }
        }
    }

    /// Resolve already-parsed tokens
    pub async fn resolve(&self, parsed: &ParsedPath) -> Result<Resolution, ResolveError> {
        let mut resolution = Resolution::default();

        let Some(prefix) = parsed.prefix.as_deref() else {
            debug!("resolve_no_prefix");
            return Ok(resolution);
        };

        let Some(route) =
            self.store.find_active_prefix(prefix).await.map_err(ResolveError::Prefix)?
        else {
            debug!(prefix = %prefix, "prefix_unmatched");
            return Ok(resolution);
        };

        let park_id = route.park_id;
        debug!(prefix = %prefix, park_id = %park_id, "prefix_matched");
        resolution.matched_park_id = Some(park_id);
        resolution.matched_park_name = route.park_name.filter(|name| !name.is_empty());

        for code in customer_code_candidates(parsed) {
            let camera = self
                .store
                .find_active_camera(park_id, code)
                .await
                .map_err(|source| ResolveError::Camera { code: code.to_string(), source })?;

            let Some(attraction_id) = accepted_attraction(camera) else {
                debug!(park_id = %park_id, code = %code, found = %camera.is_some(), "camera_candidate_skipped");
                continue;
            };

            debug!(park_id = %park_id, code = %code, attraction_id = %attraction_id, "camera_matched");
            resolution.matched_customer_code = Some(code.to_string());
            resolution.matched_attraction_id = Some(attraction_id);
            break;
        }

        if let Some(attraction_id) = resolution.matched_attraction_id {
            let attraction =
                self.store.find_attraction(attraction_id).await.map_err(ResolveError::Attraction)?;
            if attraction.is_none() {
                debug!(attraction_id = %attraction_id, "attraction_row_missing");
            }
            resolution.matched_attraction_name =
                attraction.map(|a| a.name).filter(|name| !name.is_empty());
        }

        Ok(resolution)
    }
}
