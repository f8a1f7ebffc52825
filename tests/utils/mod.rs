#![allow(dead_code)]

pub mod doubles;
pub mod factories;

use clinic_import::modules::data_import::domain::{ChunkRetryPolicy, ImportJob, ImportOptions};
use clinic_import::modules::reconciliation::{ReconciliationEngine, SnapshotReader};
use clinic_import::modules::records::CandidateRecord;
use doubles::InMemoryEntityStore;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

pub fn clinic_id() -> Uuid {
    Uuid::new_v4()
}

/// Options with fast retries so transient-failure tests don't sleep for seconds
pub fn test_options(chunk_size: usize) -> ImportOptions {
    ImportOptions::default()
        .with_chunk_size(chunk_size)
        .with_enrichment(false)
        .with_retry(ChunkRetryPolicy::new(3, Duration::from_millis(1)))
}

/// Reconcile `candidates` against the store's current contents and build a job
pub async fn prepare_job(
    store: &InMemoryEntityStore,
    clinic_id: Uuid,
    candidates: Vec<CandidateRecord>,
    chunk_size: usize,
) -> ImportJob {
    let (person_keys, org_keys) = ReconciliationEngine::snapshot_keys(&candidates);
    let snapshot = store
        .load_snapshot(clinic_id, &person_keys, &org_keys)
        .await
        .unwrap();
    let outcome = ReconciliationEngine::reconcile(candidates, &snapshot);
    ImportJob::new(
        Uuid::new_v4(),
        clinic_id,
        outcome,
        &snapshot,
        HashMap::new(),
        chunk_size,
    )
}
