//! Shared record types for path routing
//!
//! Rows mirror the backend tables `parks`, `park_path_prefixes`,
//! `park_cameras` and `attractions`. The routing core only ever reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Newtype wrapper for park IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ParkId(pub Uuid);

impl std::fmt::Display for ParkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for attraction IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct AttractionId(pub Uuid);

impl std::fmt::Display for AttractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Park {
    pub id: ParkId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Routes every upload whose first path segment equals `path_prefix` to a park
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParkPrefix {
    pub path_prefix: String,
    pub park_id: ParkId,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Maps a 4-digit customer/camera code inside a park to an optional attraction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CameraMapping {
    pub park_id: ParkId,
    pub customer_code: String,
    #[serde(default)]
    pub camera_name: Option<String>,
    #[serde(default)]
    pub attraction_id: Option<AttractionId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attraction {
    pub id: AttractionId,
    pub park_id: ParkId,
    pub name: String,
}

fn default_active() -> bool {
    true
}

/// Result of the prefix lookup: the park plus its display name when the park row exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRoute {
    pub park_id: ParkId,
    pub park_name: Option<String>,
}

/// Result of the camera lookup. A mapping may exist without an attraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRoute {
    pub attraction_id: Option<AttractionId>,
}

/// Outcome of resolving a parsed path against the routing tables.
///
/// Every field is optional; a fully empty resolution is a valid answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub matched_park_id: Option<ParkId>,
    pub matched_park_name: Option<String>,
    pub matched_customer_code: Option<String>,
    pub matched_attraction_id: Option<AttractionId>,
    pub matched_attraction_name: Option<String>,
}

impl Resolution {
    pub fn is_unmatched(&self) -> bool {
        self.matched_park_id.is_none()
    }
}
