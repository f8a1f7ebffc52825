//! HTTP client for the public organization registry.
//!
//! Every request waits on a shared governor limiter so the whole process
//! stays under the registry's published request rate.

use super::dto::RegistryOrganizationResponse;
use super::mapper::RegistryMapper;
use crate::modules::enrichment::domain::{OrgDetails, OrganizationRegistry};
use crate::shared::config::RegistrySettings;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE_NAME: &str = "OrganizationRegistry";

pub struct RegistryClient {
    client: Client,
    rate_limiter: DefaultDirectRateLimiter,
    base_url: String,
    user_agent: String,
}

impl RegistryClient {
    pub fn new(settings: &RegistrySettings) -> AppResult<Self> {
        let rate_limiter = Self::create_rate_limiter(settings.requests_per_second, settings.burst)?;

        Ok(Self {
            client: Client::new(),
            rate_limiter,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            user_agent: settings.user_agent.clone(),
        })
    }

    fn create_rate_limiter(
        requests_per_second: f64,
        burst_size: u32,
    ) -> AppResult<DefaultDirectRateLimiter> {
        if !(requests_per_second > 0.0) {
            return Err(AppError::SetupError(format!(
                "registry request rate must be positive, got {}",
                requests_per_second
            )));
        }

        let period = Duration::from_secs_f64(1.0 / requests_per_second);
        let burst = NonZeroU32::new(burst_size.max(1))
            .ok_or_else(|| AppError::SetupError("registry burst must be non-zero".to_string()))?;
        let quota = Quota::with_period(period)
            .ok_or_else(|| AppError::SetupError("registry request period is zero".to_string()))?
            .allow_burst(burst);

        Ok(RateLimiter::direct(quota))
    }

    fn organization_url(&self, org_key: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(org_key))
    }
}

#[async_trait]
impl OrganizationRegistry for RegistryClient {
    async fn fetch_organization(&self, org_key: &str) -> AppResult<Option<OrgDetails>> {
        self.rate_limiter.until_ready().await;

        let url = self.organization_url(org_key);
        debug!(org_key, %url, "querying organization registry");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(org_key, "organization registry rate limit hit");
            return Err(AppError::RateLimitError(format!(
                "{} rate limited lookup of {}",
                SERVICE_NAME, org_key
            )));
        }
        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "{} returned {} for {}",
                SERVICE_NAME, status, org_key
            )));
        }

        let payload: RegistryOrganizationResponse = response.json().await?;
        if payload.is_error() {
            debug!(
                org_key,
                reason = payload.message.as_deref().unwrap_or_default(),
                "registry reported a failed lookup"
            );
        }

        Ok(RegistryMapper::to_domain(org_key, payload))
    }

    fn service_name(&self) -> &str {
        SERVICE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(rps: f64) -> RegistrySettings {
        RegistrySettings {
            base_url: "https://registry.test/v1/org/".to_string(),
            requests_per_second: rps,
            ..Default::default()
        }
    }

    #[test]
    fn test_url_is_built_from_trimmed_base() {
        let client = RegistryClient::new(&settings(3.0)).unwrap();
        assert_eq!(
            client.organization_url("11111111000111"),
            "https://registry.test/v1/org/11111111000111"
        );
    }

    #[test]
    fn test_non_positive_rate_is_rejected() {
        assert!(matches!(
            RegistryClient::new(&settings(0.0)),
            Err(AppError::SetupError(_))
        ));
    }
}
