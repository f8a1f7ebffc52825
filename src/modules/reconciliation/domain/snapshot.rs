use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Persisted member as seen by reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
    /// Canonical key of the employer the member is affiliated with
    pub org_key: Option<String>,
    pub org_name: Option<String>,
    pub is_member: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerSummary {
    pub id: Uuid,
    pub name: String,
}

/// Read-only view of the store taken once at the start of a run.
///
/// Keyed by canonical natural key. Never refreshed during the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExistingEntitySnapshot {
    pub members: HashMap<String, MemberSummary>,
    pub employers: HashMap<String, EmployerSummary>,
}

impl ExistingEntitySnapshot {
    pub fn member(&self, person_key: &str) -> Option<&MemberSummary> {
        self.members.get(person_key)
    }

    pub fn employer(&self, org_key: &str) -> Option<&EmployerSummary> {
        self.employers.get(org_key)
    }

    pub fn has_employer(&self, org_key: &str) -> bool {
        self.employers.contains_key(org_key)
    }
}
