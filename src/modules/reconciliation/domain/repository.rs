use super::snapshot::ExistingEntitySnapshot;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Read side of the store used to build the per-run snapshot
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    /// Load the members and employers of `clinic_id` whose canonical keys are
    /// among the given ones. Unknown keys are simply absent from the result.
    async fn load_snapshot(
        &self,
        clinic_id: Uuid,
        person_keys: &[String],
        org_keys: &[String],
    ) -> AppResult<ExistingEntitySnapshot>;
}
