use super::services::import_components::retry_policy::ChunkRetryPolicy;
use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: usize = 1500;
pub const DEFAULT_UPDATE_CONCURRENCY: usize = 10;
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 5;
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller-facing knobs of one import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub chunk_size: usize,
    /// In-flight member updates within one chunk
    pub update_concurrency: usize,
    /// In-flight registry lookups
    pub enrichment_concurrency: usize,
    pub enable_enrichment: bool,
    pub enrichment_timeout: Duration,
    pub retry: ChunkRetryPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            update_concurrency: DEFAULT_UPDATE_CONCURRENCY,
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
            enable_enrichment: true,
            enrichment_timeout: DEFAULT_ENRICHMENT_TIMEOUT,
            retry: ChunkRetryPolicy::default(),
        }
    }
}

impl ImportOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_update_concurrency(mut self, concurrency: usize) -> Self {
        self.update_concurrency = concurrency;
        self
    }

    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enable_enrichment = enabled;
        self
    }

    pub fn with_retry(mut self, retry: ChunkRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::InvalidInput(
                "Chunk size must be at least 1".to_string(),
            ));
        }
        if self.update_concurrency == 0 || self.enrichment_concurrency == 0 {
            return Err(AppError::InvalidInput(
                "Concurrency limits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ImportOptions::default();
        assert_eq!(options.chunk_size, 1500);
        assert_eq!(options.update_concurrency, 10);
        assert_eq!(options.enrichment_concurrency, 5);
        assert_eq!(options.enrichment_timeout, Duration::from_secs(5));
        assert!(options.enable_enrichment);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let options = ImportOptions::default().with_chunk_size(0);
        assert!(matches!(options.validate(), Err(AppError::InvalidInput(_))));
    }
}
