//! Integration tests for configuration loading

use parkroute::infra::{Config, StoreBackend};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[site]
id = "plose"

[server]
bind_address = "127.0.0.1"
port = 9090
metrics_interval_secs = 0

[store]
backend = "rest"
rest_url = "https://example.supabase.co"
service_key = "service-role"
timeout_ms = 1500
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "plose");
    assert_eq!(config.bind_address(), "127.0.0.1");
    assert_eq!(config.port(), 9090);
    assert_eq!(config.metrics_interval_secs(), 0);
    assert_eq!(config.store_backend(), StoreBackend::Rest);
    assert_eq!(config.rest_url(), Some("https://example.supabase.co"));
    assert!(config.has_service_key());
    assert_eq!(config.store_timeout_ms(), 1500);
    assert_eq!(config.rest_credentials().unwrap(), ("https://example.supabase.co", "service-role"));
}

#[test]
fn test_sections_are_optional() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[site]\nid = \"minimal\"\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.site_id(), "minimal");
    assert_eq!(config.port(), 8787);
    assert_eq!(config.store_backend(), StoreBackend::Fixture);
}

#[test]
fn test_invalid_backend_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[store]\nbackend = \"mysql\"\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.port(), 8787);
    assert_eq!(config.store_backend(), StoreBackend::Fixture);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_rest_backend_without_credentials() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[store]\nbackend = \"rest\"\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert!(config.rest_credentials().is_err());
    assert!(parkroute::io::open_store(&config).is_err());
}
