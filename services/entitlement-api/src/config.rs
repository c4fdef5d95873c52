//! Configuration for the Entitlement API service.

use std::path::PathBuf;
use std::time::Duration;

use tollgate_core::{EngineConfig, StoreFaultPolicy};
use tollgate_types::TierCatalog;

/// Entitlement API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Engine configuration (cache TTL/capacity, store fault policy)
    pub engine: EngineConfig,
    /// Use the in-process permissions cache
    pub cache_enabled: bool,
    /// JSON tier catalog replacing the built-in one
    pub tier_catalog_path: Option<PathBuf>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Database
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        // Server
        let http_port = var("HTTP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Cache
        let cache_ttl_secs: u64 = var("CACHE_TTL_SECS")
            .unwrap_or_else(|| "300".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("CACHE_TTL_SECS"))?;

        let cache_max_entries: u64 = var("CACHE_MAX_ENTRIES")
            .unwrap_or_else(|| "10000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("CACHE_MAX_ENTRIES"))?;

        let cache_enabled = var("CACHE_ENABLED")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .unwrap_or(true);

        // Store faults on the read path
        let store_fault_policy: StoreFaultPolicy = match var("STORE_FAULT_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("STORE_FAULT_POLICY"))?,
            None => StoreFaultPolicy::default(),
        };

        let tier_catalog_path = var("TIER_CATALOG_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        // Request timeout
        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = var("METRICS_ENABLED")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .unwrap_or(true);

        let engine = EngineConfig::new()
            .with_cache_ttl(Duration::from_secs(cache_ttl_secs))
            .with_cache_capacity(cache_max_entries)
            .with_store_fault_policy(store_fault_policy);

        Ok(Self {
            http_port,
            database_url,
            engine,
            cache_enabled,
            tier_catalog_path,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }

    /// Load the configured tier catalog, or the built-in one
    pub fn load_catalog(&self) -> Result<TierCatalog, ConfigError> {
        let Some(path) = &self.tier_catalog_path else {
            return Ok(TierCatalog::standard());
        };

        let catalog_error = |reason: String| ConfigError::Catalog {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| catalog_error(e.to_string()))?;
        TierCatalog::from_json(&raw).map_err(|e| catalog_error(e.to_string()))
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Cannot load tier catalog {path}: {reason}")]
    Catalog { path: String, reason: String },
}
