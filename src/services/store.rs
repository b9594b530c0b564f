//! Routing table access
//!
//! `RoutingStore` is the seam between the resolver and whatever holds the
//! routing tables: the hosted REST backend in production, in-memory
//! fixtures in tests and local runs. Implementations only report rows that
//! are active; "not found" is `Ok(None)`, never an error.

use crate::domain::types::{Attraction, AttractionId, CameraRoute, ParkId, PrefixRoute};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a routing table lookup.
///
/// Distinct from "no row found", which is `Ok(None)`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{table} request failed: {message}")]
    Transport { table: &'static str, message: String },

    #[error("{table} request returned HTTP {status}: {body}")]
    Status { table: &'static str, status: u16, body: String },

    #[error("{table} response could not be decoded: {message}")]
    Decode { table: &'static str, message: String },

    #[error("{table} lookup matched {rows} rows, expected at most one")]
    Ambiguous { table: &'static str, rows: usize },

    #[error("routing store unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    /// Backend table the failed lookup targeted, if any
    pub fn table(&self) -> Option<&'static str> {
        match self {
            LookupError::Transport { table, .. }
            | LookupError::Status { table, .. }
            | LookupError::Decode { table, .. }
            | LookupError::Ambiguous { table, .. } => Some(table),
            LookupError::Unavailable(_) => None,
        }
    }
}

/// The three read-only lookups path resolution needs
#[async_trait]
pub trait RoutingStore: Send + Sync {
    /// Active prefix row with exactly this `path_prefix` (case-sensitive)
    async fn find_active_prefix(&self, path_prefix: &str)
        -> Result<Option<PrefixRoute>, LookupError>;

    /// Active camera mapping for `customer_code` inside `park_id`
    async fn find_active_camera(
        &self,
        park_id: ParkId,
        customer_code: &str,
    ) -> Result<Option<CameraRoute>, LookupError>;

    async fn find_attraction(
        &self,
        attraction_id: AttractionId,
    ) -> Result<Option<Attraction>, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_messages() {
        let err = LookupError::Status { table: "park_cameras", status: 503, body: "down".into() };
        assert_eq!(err.to_string(), "park_cameras request returned HTTP 503: down");
        assert_eq!(err.table(), Some("park_cameras"));

        let err = LookupError::Ambiguous { table: "park_path_prefixes", rows: 2 };
        assert_eq!(
            err.to_string(),
            "park_path_prefixes lookup matched 2 rows, expected at most one"
        );

        assert_eq!(LookupError::Unavailable("closed".into()).table(), None);
    }
}
