//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Geofence configuration.
    #[serde(default)]
    pub geofence: GeofenceConfig,
    /// Map rendering configuration.
    #[serde(default)]
    pub map: MapConfig,
    /// Photo storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Service-area geofence configuration.
///
/// The default bounding box approximates the municipality boundary of the
/// reference deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceConfig {
    /// Minimum latitude of the service area.
    #[serde(default = "default_min_lat")]
    pub min_latitude: f64,
    /// Maximum latitude of the service area.
    #[serde(default = "default_max_lat")]
    pub max_latitude: f64,
    /// Minimum longitude of the service area.
    #[serde(default = "default_min_lon")]
    pub min_longitude: f64,
    /// Maximum longitude of the service area.
    #[serde(default = "default_max_lon")]
    pub max_longitude: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            min_latitude: default_min_lat(),
            max_latitude: default_max_lat(),
            min_longitude: default_min_lon(),
            max_longitude: default_max_lon(),
        }
    }
}

/// Map rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Zoom level at or below which map reports are clustered.
    #[serde(default = "default_cluster_zoom_threshold")]
    pub cluster_zoom_threshold: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cluster_zoom_threshold: default_cluster_zoom_threshold(),
        }
    }
}

/// Photo storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base path for stored photos.
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    /// Base URL for serving photos.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_min_lat() -> f64 {
    44.95
}

const fn default_max_lat() -> f64 {
    45.15
}

const fn default_min_lon() -> f64 {
    7.55
}

const fn default_max_lon() -> f64 {
    7.75
}

const fn default_cluster_zoom_threshold() -> u8 {
    12
}

fn default_storage_path() -> String {
    "./photos".to_string()
}

fn default_storage_url() -> String {
    "/photos".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CIVIC_ENV`)
    /// 3. Environment variables with `CIVIC` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("CIVIC_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CIVIC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CIVIC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
