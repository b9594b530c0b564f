//! Infrastructure - configuration and metrics
//!
//! - `config` - Application configuration (TOML loading, defaults, env overrides)
//! - `metrics` - Lock-free metrics collection

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::{Config, StoreBackend};
pub use metrics::Metrics;
