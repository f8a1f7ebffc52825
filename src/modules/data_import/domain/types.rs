use crate::modules::records::ReconciledRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One row-level failure, reported with the record's absolute row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    /// Offending field when the failure is a validation reject
    pub field: Option<String>,
    pub message: String,
    pub person_key: String,
    pub org_key: String,
    pub name: String,
}

impl RowError {
    pub fn for_record(
        row: usize,
        record: &ReconciledRecord,
        field: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field: field.map(String::from),
            message: message.into(),
            person_key: record.canonical_person_key.clone(),
            org_key: record.canonical_org_key.clone(),
            name: record.candidate.person_name.clone(),
        }
    }
}

/// Running totals of an import run.
///
/// Only ever grows: counters are added to chunk by chunk and a failed chunk
/// contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub run_id: Uuid,
    pub total_records: usize,
    pub total_batches: usize,
    pub members_created: usize,
    pub members_updated: usize,
    pub employers_created: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub duplicates_dropped: usize,
    pub errors: Vec<RowError>,
    pub completed_batches: BTreeSet<usize>,
}

impl ImportResult {
    pub fn new(run_id: Uuid, total_records: usize, total_batches: usize) -> Self {
        Self {
            run_id,
            total_records,
            total_batches,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_batches.len() == self.total_batches
    }
}

/// Snapshots streamed to the caller of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ImportEvent {
    /// Sent after every completed chunk
    Progress(ImportResult),
    Completed(ImportResult),
    Cancelled {
        result: ImportResult,
        resume_from: usize,
    },
    Failed {
        result: ImportResult,
        failed_chunk: usize,
        error: String,
    },
}

impl ImportEvent {
    pub fn result(&self) -> &ImportResult {
        match self {
            ImportEvent::Progress(result) | ImportEvent::Completed(result) => result,
            ImportEvent::Cancelled { result, .. } | ImportEvent::Failed { result, .. } => result,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ImportEvent::Progress(_))
    }
}
