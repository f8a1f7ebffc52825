use crate::log_debug;
use crate::modules::reconciliation::domain::rules::{self, has_valid_person_key};
use crate::modules::reconciliation::domain::ExistingEntitySnapshot;
use crate::modules::records::{CandidateRecord, ReconcileAction, ReconciledRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Records that go on to execution, plus what was folded away on the way
#[derive(Debug, Clone, Default)]
pub struct ReconciliationOutcome {
    pub records: Vec<ReconciledRecord>,
    /// Every candidate handed in, duplicates included
    pub total_records: usize,
    pub duplicates_dropped: usize,
}

impl ReconciliationOutcome {
    pub fn count(&self, action: ReconcileAction) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }

    /// Organization keys referenced by creates/updates that the store does not know yet
    pub fn new_org_keys(&self, snapshot: &ExistingEntitySnapshot) -> Vec<String> {
        let keys: BTreeSet<&String> = self
            .records
            .iter()
            .filter(|r| r.is_executable())
            .map(|r| &r.canonical_org_key)
            .filter(|key| !snapshot.has_employer(key))
            .collect();
        keys.into_iter().cloned().collect()
    }
}

/// Dry-run view of a reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_records: usize,
    pub to_create: usize,
    pub to_update: usize,
    pub to_skip: usize,
    pub rejected: usize,
    pub duplicates_dropped: usize,
    pub new_organizations: usize,
}

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Canonical keys to load the snapshot for
    pub fn snapshot_keys(candidates: &[CandidateRecord]) -> (Vec<String>, Vec<String>) {
        let mut person_keys = BTreeSet::new();
        let mut org_keys = BTreeSet::new();
        for candidate in candidates {
            let record = ReconciledRecord::pending(candidate.clone());
            if has_valid_person_key(&record) {
                person_keys.insert(record.canonical_person_key);
            }
            if !record.canonical_org_key.is_empty() {
                org_keys.insert(record.canonical_org_key);
            }
        }
        (
            person_keys.into_iter().collect(),
            org_keys.into_iter().collect(),
        )
    }

    /// Normalize, group by person key and decide an action for every candidate.
    ///
    /// Output keeps input order. Within a person-key group only the first
    /// candidate survives; candidates with an unusable person key are never
    /// grouped and each yields its own reject.
    pub fn reconcile(
        candidates: Vec<CandidateRecord>,
        snapshot: &ExistingEntitySnapshot,
    ) -> ReconciliationOutcome {
        let total_records = candidates.len();
        let mut seen: HashSet<String> = HashSet::with_capacity(total_records);
        let mut records = Vec::with_capacity(total_records);
        let mut duplicates_dropped = 0;

        for candidate in candidates {
            let record = ReconciledRecord::pending(candidate.normalized());

            if has_valid_person_key(&record) && !seen.insert(record.canonical_person_key.clone()) {
                log_debug!(
                    "Dropping duplicate candidate for person key {}",
                    record.canonical_person_key
                );
                duplicates_dropped += 1;
                continue;
            }

            records.push(rules::decide(record, snapshot));
        }

        ReconciliationOutcome {
            records,
            total_records,
            duplicates_dropped,
        }
    }

    pub fn summarize(
        outcome: &ReconciliationOutcome,
        snapshot: &ExistingEntitySnapshot,
    ) -> ReconciliationSummary {
        ReconciliationSummary {
            total_records: outcome.total_records,
            to_create: outcome.count(ReconcileAction::Create),
            to_update: outcome.count(ReconcileAction::Update),
            to_skip: outcome.count(ReconcileAction::Skip),
            rejected: outcome.count(ReconcileAction::Reject),
            duplicates_dropped: outcome.duplicates_dropped,
            new_organizations: outcome.new_org_keys(snapshot).len(),
        }
    }
}
