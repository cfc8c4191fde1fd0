use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
///
/// Values come from an optional TOML file overlaid by environment variables
/// with the `MOODTUNES_` prefix and `__` between nested keys. For example:
/// `MOODTUNES_SERVER__PORT=8080`, `MOODTUNES_CATALOG__API_KEY=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub recommendations: RecommendationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    /// Returns the socket address for binding the server
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// gRPC endpoint of the emotion model service
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            timeout_ms: default_classifier_timeout_ms(),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_classifier_endpoint() -> String {
    "http://127.0.0.1:50051".to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Root of the video catalog API
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,

    /// API key; required
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_catalog_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            api_key: String::new(),
            timeout_ms: default_catalog_timeout_ms(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_catalog_base_url() -> String {
    catalog_client::DEFAULT_BASE_URL.to_string()
}

fn default_catalog_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    /// Tracks requested from the catalog per request
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    pipeline::DEFAULT_LIMIT
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for request-scoped upload files (default: OS temp dir)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, Environment::with_prefix("MOODTUNES"))
    }

    fn from_sources(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "catalog.api_key is required (MOODTUNES_CATALOG__API_KEY)".to_string(),
            ));
        }
        if self.recommendations.limit == 0 {
            return Err(ConfigError::Message(
                "recommendations.limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
