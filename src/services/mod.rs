//! Services - routing logic
//!
//! - `store` - `RoutingStore` seam over the routing tables
//! - `resolver` - staged prefix/camera/attraction resolution

pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use resolver::{PathPreview, PathResolver, ResolveError};
pub use store::{LookupError, RoutingStore};
