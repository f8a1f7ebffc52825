use crate::log_warn;
use crate::modules::audit::domain::{AuditEntry, AuditSink};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory audit log with a best-effort durable copy.
///
/// Recording never fails: a sink error is logged and the entry is kept in memory.
#[derive(Clone, Default)]
pub struct AuditRecorder {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditRecorder {
    pub fn new(sink: Option<Arc<dyn AuditSink>>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            sink,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub async fn record(&self, entry: AuditEntry) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist(&entry).await {
                log_warn!(
                    "Audit entry {} ({}) for run {} not persisted: {}",
                    entry.id,
                    entry.action,
                    entry.run_id,
                    e
                );
            }
        }
        self.entries.write().await.push(entry);
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_for_run(&self, run_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::audit::domain::AuditAction;
    use crate::shared::errors::{AppError, AppResult};
    use async_trait::async_trait;

    struct BrokenSink;

    #[async_trait]
    impl AuditSink for BrokenSink {
        async fn persist(&self, _entry: &AuditEntry) -> AppResult<()> {
            Err(AppError::DatabaseError("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let recorder = AuditRecorder::new(Some(Arc::new(BrokenSink)));
        let run_id = Uuid::new_v4();

        recorder
            .record(AuditEntry::new(run_id, Uuid::new_v4(), AuditAction::RunStarted))
            .await;
        recorder
            .record(AuditEntry::new(Uuid::new_v4(), Uuid::new_v4(), AuditAction::RunStarted))
            .await;

        assert_eq!(recorder.entries().await.len(), 2);
        let for_run = recorder.entries_for_run(run_id).await;
        assert_eq!(for_run.len(), 1);
        assert_eq!(for_run[0].action, AuditAction::RunStarted);
    }
}
