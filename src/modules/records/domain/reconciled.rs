use super::candidate::CandidateRecord;
use super::natural_key::canonicalize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the import will do with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    Create,
    Update,
    Skip,
    Reject,
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileAction::Create => write!(f, "create"),
            ReconcileAction::Update => write!(f, "update"),
            ReconcileAction::Skip => write!(f, "skip"),
            ReconcileAction::Reject => write!(f, "reject"),
        }
    }
}

/// Outcome of executing a record, set by the batch executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Pending,
    Created,
    Updated,
    /// Upsert hit an entity that already existed (re-applied, not counted)
    Unchanged,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub candidate: CandidateRecord,
    pub canonical_person_key: String,
    pub canonical_org_key: String,
    pub action: ReconcileAction,
    pub error_message: Option<String>,
    pub matched_entity_id: Option<Uuid>,
    pub result_status: ResultStatus,
    /// Entity created or updated for this record
    pub entity_id: Option<Uuid>,
}

impl ReconciledRecord {
    /// Record with canonical keys derived and no decision taken yet
    pub fn pending(candidate: CandidateRecord) -> Self {
        let canonical_person_key = canonicalize(&candidate.person_id);
        let canonical_org_key = canonicalize(&candidate.org_id);
        Self {
            candidate,
            canonical_person_key,
            canonical_org_key,
            action: ReconcileAction::Create,
            error_message: None,
            matched_entity_id: None,
            result_status: ResultStatus::Pending,
            entity_id: None,
        }
    }

    pub fn reject(mut self, message: impl Into<String>) -> Self {
        self.action = ReconcileAction::Reject;
        self.error_message = Some(message.into());
        self.matched_entity_id = None;
        self
    }

    pub fn with_action(mut self, action: ReconcileAction, matched: Option<Uuid>) -> Self {
        self.action = action;
        self.error_message = None;
        self.matched_entity_id = matched;
        self
    }

    /// Creates and updates touch the store; skips and rejects never do
    pub fn is_executable(&self) -> bool {
        matches!(self.action, ReconcileAction::Create | ReconcileAction::Update)
    }
}
