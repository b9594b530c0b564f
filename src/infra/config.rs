//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! The REST backend URL and service key may also come from the deployment
//! environment (`SUPABASE_URL` / `NEXT_PUBLIC_SUPABASE_URL`,
//! `SUPABASE_SERVICE_ROLE_KEY`), which take precedence over the file.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const ENV_REST_URL: &str = "SUPABASE_URL";
pub const ENV_REST_URL_PUBLIC: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-memory tables from a TOML fixture file
    Fixture,
    /// Hosted database REST API
    Rest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Deployment identifier used as metrics label
    #[serde(default = "default_site_id")]
    pub id: String,
}

fn default_site_id() -> String {
    "parkroute".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interval for logging the metrics summary (0 to disable)
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_metrics_interval() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            metrics_interval_secs: default_metrics_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_fixture_file")]
    pub fixture_file: String,
    #[serde(default)]
    pub rest_url: Option<String>,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Fixture
}

fn default_fixture_file() -> String {
    "config/fixtures.toml".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            fixture_file: default_fixture_file(),
            rest_url: None,
            service_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    bind_address: String,
    port: u16,
    metrics_interval_secs: u64,
    store_backend: StoreBackend,
    fixture_file: String,
    rest_url: Option<String>,
    service_key: Option<String>,
    store_timeout_ms: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: &str) -> Self {
        Self {
            site_id: toml_config.site.id,
            bind_address: toml_config.server.bind_address,
            port: toml_config.server.port,
            metrics_interval_secs: toml_config.server.metrics_interval_secs,
            store_backend: toml_config.store.backend,
            fixture_file: toml_config.store.fixture_file,
            rest_url: toml_config.store.rest_url.filter(|s| !s.trim().is_empty()),
            service_key: toml_config.store.service_key.filter(|s| !s.trim().is_empty()),
            store_timeout_ms: toml_config.store.timeout_ms,
            config_file: config_file.to_string(),
        }
    }

    /// Determine config file path from an explicit argument or environment
    pub fn resolve_config_path(arg: Option<&str>) -> String {
        if let Some(path) = arg {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Apply deployment environment overrides for the REST backend
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_REST_URL).or_else(|| non_empty(ENV_REST_URL_PUBLIC)) {
            self.rest_url = Some(url);
        }
        if let Some(key) = non_empty(ENV_SERVICE_KEY) {
            self.service_key = Some(key);
        }
        self
    }

    /// REST URL and service key, required when the REST backend is selected
    pub fn rest_credentials(&self) -> anyhow::Result<(&str, &str)> {
        match (self.rest_url.as_deref(), self.service_key.as_deref()) {
            (Some(url), Some(key)) => Ok((url, key)),
            _ => bail!(
                "REST store requires store.rest_url/{} or {} and store.service_key/{}",
                ENV_REST_URL,
                ENV_REST_URL_PUBLIC,
                ENV_SERVICE_KEY
            ),
        }
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    pub fn fixture_file(&self) -> &str {
        &self.fixture_file
    }

    pub fn rest_url(&self) -> Option<&str> {
        self.rest_url.as_deref()
    }

    pub fn has_service_key(&self) -> bool {
        self.service_key.is_some()
    }

    pub fn store_timeout_ms(&self) -> u64 {
        self.store_timeout_ms
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site_id(), "parkroute");
        assert_eq!(config.bind_address(), "0.0.0.0");
        assert_eq!(config.port(), 8787);
        assert_eq!(config.store_backend(), StoreBackend::Fixture);
        assert_eq!(config.fixture_file(), "config/fixtures.toml");
        assert_eq!(config.store_timeout_ms(), 5000);
        assert_eq!(config.rest_url(), None);
        assert!(!config.has_service_key());
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_missing_site_section_uses_default_id() {
        let toml_config: TomlConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        let config = Config::from_toml(toml_config, "inline");
        assert_eq!(config.site_id(), "parkroute");
        assert_eq!(config.port(), 9000);
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        assert_eq!(Config::resolve_config_path(Some("config/prod.toml")), "config/prod.toml");
    }

    #[test]
    fn test_env_overrides_prefer_server_url() {
        let config = Config::default().with_overrides(env_of(&[
            (ENV_REST_URL_PUBLIC, "https://public.example"),
            (ENV_REST_URL, "https://server.example"),
            (ENV_SERVICE_KEY, "secret"),
        ]));
        assert_eq!(config.rest_url(), Some("https://server.example"));
        assert_eq!(config.rest_credentials().unwrap(), ("https://server.example", "secret"));
    }

    #[test]
    fn test_env_overrides_public_url_fallback() {
        let config = Config::default()
            .with_overrides(env_of(&[(ENV_REST_URL, " "), (ENV_REST_URL_PUBLIC, "https://p.example")]));
        assert_eq!(config.rest_url(), Some("https://p.example"));
        assert!(config.rest_credentials().is_err());
    }

    #[test]
    fn test_empty_values_in_file_are_ignored() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
[store]
backend = "rest"
rest_url = ""
service_key = "  "
"#,
        )
        .unwrap();
        let config = Config::from_toml(toml_config, "inline");
        assert_eq!(config.store_backend(), StoreBackend::Rest);
        assert_eq!(config.rest_url(), None);
        assert!(!config.has_service_key());
    }
}
