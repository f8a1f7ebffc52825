/// Database mapping of audit actions
use super::entities::AuditAction;
use serde::{Deserialize, Serialize};

/// Audit action enum matching database type
#[derive(
    diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::AuditAction"]
#[serde(rename_all = "snake_case")]
pub enum AuditActionDb {
    RunStarted,
    RunResumed,
    BatchCompleted,
    BatchFailed,
    RunCompleted,
    RunFailed,
    RunCancelled,
}

impl From<AuditAction> for AuditActionDb {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::RunStarted => AuditActionDb::RunStarted,
            AuditAction::RunResumed => AuditActionDb::RunResumed,
            AuditAction::BatchCompleted => AuditActionDb::BatchCompleted,
            AuditAction::BatchFailed => AuditActionDb::BatchFailed,
            AuditAction::RunCompleted => AuditActionDb::RunCompleted,
            AuditAction::RunFailed => AuditActionDb::RunFailed,
            AuditAction::RunCancelled => AuditActionDb::RunCancelled,
        }
    }
}

impl From<AuditActionDb> for AuditAction {
    fn from(action: AuditActionDb) -> Self {
        match action {
            AuditActionDb::RunStarted => AuditAction::RunStarted,
            AuditActionDb::RunResumed => AuditAction::RunResumed,
            AuditActionDb::BatchCompleted => AuditAction::BatchCompleted,
            AuditActionDb::BatchFailed => AuditAction::BatchFailed,
            AuditActionDb::RunCompleted => AuditAction::RunCompleted,
            AuditActionDb::RunFailed => AuditAction::RunFailed,
            AuditActionDb::RunCancelled => AuditAction::RunCancelled,
        }
    }
}
