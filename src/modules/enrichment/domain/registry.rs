//! Port to the external organization registry
use super::org_details::OrgDetails;
use crate::shared::errors::AppResult;
use async_trait::async_trait;

#[async_trait]
pub trait OrganizationRegistry: Send + Sync {
    /// Look up one organization by canonical key.
    ///
    /// `Ok(None)` means the registry answered but knows nothing usable
    /// (unknown key or a logically failed response).
    async fn fetch_organization(&self, org_key: &str) -> AppResult<Option<OrgDetails>>;

    fn service_name(&self) -> &str;
}
