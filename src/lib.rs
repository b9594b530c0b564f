//! Park routing library
//!
//! Parses ingested photo storage paths and routes them to a park, camera
//! code and attraction. Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
