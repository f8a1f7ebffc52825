/// Append-only audit trail of import runs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RunStarted,
    RunResumed,
    BatchCompleted,
    BatchFailed,
    RunCompleted,
    RunFailed,
    RunCancelled,
}

impl AuditAction {
    /// Completed, failed and cancelled close a run invocation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuditAction::RunCompleted | AuditAction::RunFailed | AuditAction::RunCancelled
        )
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::RunStarted => write!(f, "run_started"),
            AuditAction::RunResumed => write!(f, "run_resumed"),
            AuditAction::BatchCompleted => write!(f, "batch_completed"),
            AuditAction::BatchFailed => write!(f, "batch_failed"),
            AuditAction::RunCompleted => write!(f, "run_completed"),
            AuditAction::RunFailed => write!(f, "run_failed"),
            AuditAction::RunCancelled => write!(f, "run_cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEntityKind {
    Run,
    Batch,
}

impl std::fmt::Display for AuditEntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditEntityKind::Run => write!(f, "run"),
            AuditEntityKind::Batch => write!(f, "batch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub run_id: Uuid,
    pub clinic_id: Uuid,
    pub action: AuditAction,
    pub entity_kind: AuditEntityKind,
    pub entity_id: Option<Uuid>,
    pub details: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Run-level entry whose entity is the run itself
    pub fn new(run_id: Uuid, clinic_id: Uuid, action: AuditAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            clinic_id,
            action,
            entity_kind: AuditEntityKind::Run,
            entity_id: Some(run_id),
            details: JsonValue::Null,
            recorded_at: Utc::now(),
        }
    }

    /// Files the entry under one chunk of the run. The id is stable across
    /// invocations so a failed chunk and its resumed completion share it.
    pub fn for_batch(mut self, index: usize) -> Self {
        self.entity_kind = AuditEntityKind::Batch;
        self.entity_id = Some(batch_entity_id(self.run_id, index));
        self
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }
}

pub fn batch_entity_id(run_id: Uuid, index: usize) -> Uuid {
    Uuid::new_v5(&run_id, format!("batch-{}", index).as_bytes())
}
