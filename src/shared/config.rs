//! Environment-driven configuration
//!
//! Values are read from the process environment after loading `.env` with
//! `dotenvy`. Anything unset falls back to the defaults of `ImportOptions`
//! and `RegistrySettings`.

use crate::modules::data_import::domain::services::import_components::retry_policy::ChunkRetryPolicy;
use crate::modules::data_import::domain::ImportOptions;
use crate::shared::errors::{AppError, AppResult};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://receitaws.com.br/v1/cnpj";

/// Connection settings of the organization registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    pub base_url: String,
    pub requests_per_second: f64,
    pub burst: u32,
    pub user_agent: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_BASE_URL.to_string(),
            requests_per_second: 3.0,
            burst: 3,
            user_agent: "clinic-import/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub database_url: Option<String>,
    pub registry: RegistrySettings,
    pub options: ImportOptions,
}

impl ImportConfig {
    /// Load `.env` (if present) and read the configuration from the environment
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; `from_env` uses the process environment
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = RegistrySettings::default();
        if let Some(url) = lookup("REGISTRY_BASE_URL") {
            registry.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(rate) = parse_var::<f64, _>(&lookup, "REGISTRY_REQUESTS_PER_SECOND")? {
            if rate <= 0.0 {
                return Err(AppError::InvalidInput(
                    "REGISTRY_REQUESTS_PER_SECOND must be positive".to_string(),
                ));
            }
            registry.requests_per_second = rate;
        }

        let mut options = ImportOptions::default();
        if let Some(size) = parse_var(&lookup, "IMPORT_CHUNK_SIZE")? {
            options.chunk_size = size;
        }
        if let Some(concurrency) = parse_var(&lookup, "IMPORT_UPDATE_CONCURRENCY")? {
            options.update_concurrency = concurrency;
        }
        if let Some(concurrency) = parse_var(&lookup, "IMPORT_ENRICHMENT_CONCURRENCY")? {
            options.enrichment_concurrency = concurrency;
        }
        if let Some(enabled) = parse_var(&lookup, "IMPORT_ENABLE_ENRICHMENT")? {
            options.enable_enrichment = enabled;
        }
        if let Some(ms) = parse_var(&lookup, "IMPORT_ENRICHMENT_TIMEOUT_MS")? {
            options.enrichment_timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var(&lookup, "IMPORT_MAX_RETRIES")? {
            options.retry = ChunkRetryPolicy::new(retries, options.retry.base_delay);
        }
        if let Some(ms) = parse_var(&lookup, "IMPORT_RETRY_BASE_DELAY_MS")? {
            options.retry = ChunkRetryPolicy::new(options.retry.max_retries, Duration::from_millis(ms));
        }
        options.validate()?;

        Ok(Self {
            database_url: lookup("DATABASE_URL"),
            registry,
            options,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::InvalidInput(format!("{} has invalid value '{}': {}", key, raw, e))),
    }
}
