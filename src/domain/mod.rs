//! Domain models - path tokens and routing records
//!
//! This module contains the canonical data types used throughout the system:
//! - `filename` - storage path parser and `ParsedPath`
//! - `types` - routing table rows, IDs and `Resolution`
//! - `validation` - input rules for prefixes and customer codes

pub mod filename;
pub mod types;
pub mod validation;

// Re-export commonly used types at module level
pub use filename::{parse_filename, ParsedPath};
pub use types::{AttractionId, ParkId, Resolution};
