/// Durable destination of audit entries
use super::entities::AuditEntry;
use crate::shared::errors::AppResult;
use async_trait::async_trait;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn persist(&self, entry: &AuditEntry) -> AppResult<()>;
}
