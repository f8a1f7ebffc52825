use crate::modules::enrichment::domain::{OrgDetails, OrganizationRegistry};
use crate::shared::utils::{LogContext, TimedOperation};
use crate::{log_debug, log_warn};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Best-effort organization lookups.
///
/// Lookups never fail the caller: errors, timeouts and unknown keys all
/// collapse to "no data" and employer creation falls back to the document name.
#[derive(Clone)]
pub struct EnrichmentService {
    registry: Arc<dyn OrganizationRegistry>,
}

impl EnrichmentService {
    pub fn new(registry: Arc<dyn OrganizationRegistry>) -> Self {
        Self { registry }
    }

    pub async fn lookup_organization(&self, org_key: &str, limit: Duration) -> Option<OrgDetails> {
        let service = self.registry.service_name().to_string();
        LogContext::api_call(&service, org_key, "started", None);

        match timeout(limit, self.registry.fetch_organization(org_key)).await {
            Ok(Ok(Some(details))) => Some(details),
            Ok(Ok(None)) => {
                log_debug!("{}: no usable data for {}", service, org_key);
                None
            }
            Ok(Err(e)) => {
                log_warn!("{}: lookup of {} failed: {}", service, org_key, e);
                None
            }
            Err(_) => {
                log_warn!("{}: lookup of {} timed out after {:?}", service, org_key, limit);
                None
            }
        }
    }

    /// Look up many organizations at once, at most `concurrency` in flight.
    ///
    /// Keys are deduplicated and every input key appears in the map.
    pub async fn batch_lookup_organizations(
        &self,
        org_keys: &[String],
        concurrency: usize,
        limit: Duration,
    ) -> HashMap<String, Option<OrgDetails>> {
        let unique: BTreeSet<&String> = org_keys.iter().collect();
        if unique.is_empty() {
            return HashMap::new();
        }

        let timer = TimedOperation::new("organization enrichment");
        let requested = unique.len();

        let results: HashMap<String, Option<OrgDetails>> = stream::iter(unique)
            .map(|key| async move { (key.clone(), self.lookup_organization(key, limit).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let found = results.values().filter(|d| d.is_some()).count();
        timer.finish(&format!("{} of {} organizations found", found, requested));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::{AppError, AppResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedRegistry {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OrganizationRegistry for ScriptedRegistry {
        async fn fetch_organization(&self, org_key: &str) -> AppResult<Option<OrgDetails>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match org_key {
                "11111111000111" => Ok(Some(OrgDetails {
                    org_key: org_key.to_string(),
                    legal_name: Some("ACME LTDA".into()),
                    ..Default::default()
                })),
                "22222222000122" => Err(AppError::ExternalServiceError("503".into())),
                "33333333000133" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(None)
                }
                _ => Ok(None),
            }
        }

        fn service_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_batch_lookup_dedups_and_drops_failures() {
        let registry = Arc::new(ScriptedRegistry {
            calls: AtomicUsize::new(0),
        });
        let service = EnrichmentService::new(registry.clone());

        let keys: Vec<String> = [
            "11111111000111",
            "11111111000111",
            "22222222000122",
            "33333333000133",
            "44444444000144",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();

        let found = service
            .batch_lookup_organizations(&keys, 3, Duration::from_millis(50))
            .await;

        assert_eq!(found.len(), 4);
        assert_eq!(
            found["11111111000111"]
                .as_ref()
                .and_then(|d| d.legal_name.as_deref()),
            Some("ACME LTDA")
        );
        assert!(found["22222222000122"].is_none());
        assert!(found["33333333000133"].is_none());
        assert!(found["44444444000144"].is_none());
        assert_eq!(registry.calls.load(Ordering::SeqCst), 4);
    }
}
