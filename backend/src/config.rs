//! Configuration management for the Food Rescue Network
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with FRN_ prefix

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Which donation store backs the service
    pub storage: StorageConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// Handover code configuration
    pub handover: HandoverConfig,

    /// Proximity matching configuration
    pub matching: MatchingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret shared with the auth service for verifying tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandoverConfig {
    /// Key for hashing handover codes at rest
    pub secret: String,

    /// Wrong submissions allowed before verification locks
    pub max_failed_attempts: i32,

    /// Allow accepted → completed without the picked step
    pub allow_completion_from_accepted: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Radius used when the request omits one
    pub default_radius_km: f64,

    /// Largest radius a volunteer may search
    pub max_radius_km: f64,

    /// Return nearby donations closest first
    pub sort_by_distance: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("FRN_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FRN_ prefix)
            .add_source(
                Environment::with_prefix("FRN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("handover.max_failed_attempts", 5)?
            .set_default("handover.allow_completion_from_accepted", false)?
            .set_default("matching.default_radius_km", shared::DEFAULT_RADIUS_KM)?
            .set_default("matching.max_radius_km", 50.0)?
            .set_default("matching.sort_by_distance", true)
    }

    /// Configuration for tests and local tooling backed by the in-memory store
    pub fn for_testing() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-jwt-secret".to_string(),
            },
            handover: HandoverConfig {
                secret: "test-handover-secret".to_string(),
                max_failed_attempts: 5,
                allow_completion_from_accepted: false,
            },
            matching: MatchingConfig {
                default_radius_km: shared::DEFAULT_RADIUS_KM,
                max_radius_km: 50.0,
                sort_by_distance: true,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}
