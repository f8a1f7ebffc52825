//! Per-record reconciliation rules. First matching rule wins.
use super::snapshot::{ExistingEntitySnapshot, MemberSummary};
use crate::modules::records::domain::natural_key::{ORG_KEY_DIGITS, PERSON_KEY_DIGITS};
use crate::modules::records::{ReconcileAction, ReconciledRecord};

pub const INVALID_PERSON_IDENTIFIER: &str = "invalid person identifier";
pub const INVALID_ORGANIZATION_IDENTIFIER: &str = "invalid organization identifier";
pub const INVALID_NAME: &str = "invalid name";

const MIN_NAME_CHARS: usize = 3;

pub fn has_valid_person_key(record: &ReconciledRecord) -> bool {
    record.canonical_person_key.len() >= PERSON_KEY_DIGITS
}

pub fn decide(record: ReconciledRecord, snapshot: &ExistingEntitySnapshot) -> ReconciledRecord {
    if !has_valid_person_key(&record) {
        return record.reject(INVALID_PERSON_IDENTIFIER);
    }
    if record.canonical_org_key.len() < ORG_KEY_DIGITS {
        return record.reject(INVALID_ORGANIZATION_IDENTIFIER);
    }
    if record.candidate.person_name.trim().chars().count() < MIN_NAME_CHARS {
        return record.reject(INVALID_NAME);
    }

    match snapshot.member(&record.canonical_person_key) {
        Some(existing) => {
            let action = if needs_update(existing, &record.canonical_org_key) {
                ReconcileAction::Update
            } else {
                ReconcileAction::Skip
            };
            let matched = Some(existing.id);
            record.with_action(action, matched)
        }
        None => record.with_action(ReconcileAction::Create, None),
    }
}

/// A known member is updated when its affiliation changed, it is not flagged
/// as a member yet, or its affiliated organization has no display name.
fn needs_update(existing: &MemberSummary, org_key: &str) -> bool {
    let org_changed = existing.org_key.as_deref() != Some(org_key);
    let org_name_missing = existing
        .org_name
        .as_deref()
        .map(|name| name.trim().is_empty())
        .unwrap_or(true);

    org_changed || !existing.is_member || org_name_missing
}
