//! Chunked execution of reconciled records against the entity store
//!
//! Chunks run strictly in order. Inside a chunk, employers are upserted first,
//! then member creates, then member updates with bounded concurrency. A chunk
//! either completes and is merged into the run result, or fails as a whole and
//! leaves the result untouched so it can be resumed.

use super::progress_tracker::ProgressTracker;
use crate::modules::audit::{AuditAction, AuditEntry, AuditRecorder};
use crate::modules::data_import::domain::entities::{partition, ImportBatch, RunStatus};
use crate::modules::data_import::domain::options::ImportOptions;
use crate::modules::data_import::domain::repository::{
    EntityRows, EntityStore, MemberChanges, NewEmployer, NewMember, UpsertedEntity,
};
use crate::modules::data_import::domain::types::{ImportResult, RowError};
use crate::modules::enrichment::{resolve_display_name, OrgDetails};
use crate::modules::reconciliation::application::ReconciliationOutcome;
use crate::modules::reconciliation::domain::{
    ExistingEntitySnapshot, INVALID_NAME, INVALID_ORGANIZATION_IDENTIFIER,
    INVALID_PERSON_IDENTIFIER,
};
use crate::modules::records::{ReconcileAction, ReconciledRecord, ResultStatus};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_debug, log_error, log_info, log_warn};
use futures::{stream, StreamExt};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Everything a run needs between invocations (start and any resumes)
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub run_id: Uuid,
    pub clinic_id: Uuid,
    pub records: Vec<ReconciledRecord>,
    pub batches: Vec<ImportBatch>,
    /// Employers known to exist, from the snapshot plus those created by completed chunks
    pub employer_ids: HashMap<String, Uuid>,
    /// Display names of stored employers, used for member affiliation
    pub employer_names: HashMap<String, String>,
    pub enrichment: HashMap<String, Option<OrgDetails>>,
    pub result: ImportResult,
    pub status: RunStatus,
    /// Employers inserted by a chunk that later failed; still owed to `employers_created`
    provisional_employers: HashSet<String>,
    /// Members inserted by a chunk that later failed; still owed to `members_created`
    provisional_members: HashSet<String>,
    invocations: usize,
}

impl ImportJob {
    pub fn new(
        run_id: Uuid,
        clinic_id: Uuid,
        outcome: ReconciliationOutcome,
        snapshot: &ExistingEntitySnapshot,
        enrichment: HashMap<String, Option<OrgDetails>>,
        chunk_size: usize,
    ) -> Self {
        let batches = partition(run_id, outcome.records.len(), chunk_size);
        let mut result = ImportResult::new(run_id, outcome.total_records, batches.len());
        result.duplicates_dropped = outcome.duplicates_dropped;

        let employer_ids = snapshot
            .employers
            .iter()
            .map(|(key, employer)| (key.clone(), employer.id))
            .collect();
        let employer_names = snapshot
            .employers
            .iter()
            .map(|(key, employer)| (key.clone(), employer.name.clone()))
            .collect();

        Self {
            run_id,
            clinic_id,
            records: outcome.records,
            batches,
            employer_ids,
            employer_names,
            enrichment,
            result,
            status: RunStatus::Idle,
            provisional_employers: HashSet::new(),
            provisional_members: HashSet::new(),
            invocations: 0,
        }
    }

    fn is_resumed(&self) -> bool {
        self.invocations > 1
    }
}

/// What one successful chunk adds to the run
#[derive(Debug, Default)]
struct ChunkOutcome {
    members_created: usize,
    members_updated: usize,
    employers_created: usize,
    skipped: usize,
    rejected: usize,
    errors: Vec<RowError>,
    employer_ids: HashMap<String, Uuid>,
    employer_names: HashMap<String, String>,
    /// (offset in chunk, status, entity id)
    annotations: Vec<(usize, ResultStatus, Option<Uuid>)>,
}

struct ChunkFailure {
    error: AppError,
    inserted_employers: Vec<String>,
    inserted_members: Vec<String>,
}

/// A multi-row upsert that could not be settled row by row
struct UpsertAbort {
    error: AppError,
    /// Rows written before the abort
    saved: Vec<UpsertedEntity>,
}

#[derive(Clone)]
pub struct BatchExecutor {
    store: Arc<dyn EntityStore>,
    audit: AuditRecorder,
    options: ImportOptions,
}

impl BatchExecutor {
    pub fn new(store: Arc<dyn EntityStore>, audit: AuditRecorder, options: ImportOptions) -> Self {
        Self {
            store,
            audit,
            options,
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Execute the job from `from_chunk` until it completes, fails or is cancelled.
    ///
    /// Cancellation is only observed between chunks. The returned status is also
    /// stored on the job.
    pub async fn run(
        &self,
        job: &mut ImportJob,
        from_chunk: usize,
        cancel: &CancellationToken,
        tracker: &ProgressTracker,
    ) -> RunStatus {
        let timer = TimedOperation::new("import run");
        job.invocations += 1;
        job.status = RunStatus::Running;
        tracker.started().await;

        let start_action = if job.is_resumed() {
            AuditAction::RunResumed
        } else {
            AuditAction::RunStarted
        };
        self.audit
            .record(
                AuditEntry::new(job.run_id, job.clinic_id, start_action).with_details(json!({
                    "total_records": job.result.total_records,
                    "reconciled_records": job.records.len(),
                    "total_batches": job.batches.len(),
                    "from_chunk": from_chunk,
                    "duplicates_dropped": job.result.duplicates_dropped,
                })),
            )
            .await;

        log_info!(
            "Import {} {} at chunk {}/{} ({} records)",
            job.run_id,
            if job.is_resumed() { "resuming" } else { "starting" },
            from_chunk,
            job.batches.len(),
            job.records.len()
        );

        let status = self.run_chunks(job, from_chunk, cancel, tracker).await;

        let (terminal, summary) = match &status {
            RunStatus::Cancelled { resume_from } => (
                AuditAction::RunCancelled,
                json!({ "resume_from": resume_from }),
            ),
            RunStatus::FailedPendingResume {
                failed_chunk,
                error,
            } => (
                AuditAction::RunFailed,
                json!({ "failed_chunk": failed_chunk, "error": error }),
            ),
            _ => (AuditAction::RunCompleted, json!({})),
        };
        self.audit
            .record(
                AuditEntry::new(job.run_id, job.clinic_id, terminal)
                    .with_details(with_counts(summary, &job.result)),
            )
            .await;

        job.status = status.clone();
        tracker.finished(&status, &job.result).await;
        timer.finish(&format!("run {} {}", job.run_id, status));
        status
    }

    async fn run_chunks(
        &self,
        job: &mut ImportJob,
        from_chunk: usize,
        cancel: &CancellationToken,
        tracker: &ProgressTracker,
    ) -> RunStatus {
        let total = job.batches.len();

        for index in from_chunk..total {
            if cancel.is_cancelled() {
                log_info!("Import {} cancelled before chunk {}", job.run_id, index);
                return RunStatus::Cancelled { resume_from: index };
            }
            if job.result.completed_batches.contains(&index) {
                continue;
            }

            let batch = job.batches[index].clone();
            match self.process_chunk(job, &batch).await {
                Ok(outcome) => {
                    self.audit
                        .record(
                            AuditEntry::new(job.run_id, job.clinic_id, AuditAction::BatchCompleted)
                                .for_batch(index)
                                .with_details(json!({
                                    "batch": index,
                                    "rows": batch.len(),
                                    "members_created": outcome.members_created,
                                    "members_updated": outcome.members_updated,
                                    "employers_created": outcome.employers_created,
                                    "skipped": outcome.skipped,
                                    "rejected": outcome.rejected,
                                    "errors": outcome.errors.len(),
                                })),
                        )
                        .await;

                    merge(job, &batch, outcome);
                    LogContext::import_progress(&job.run_id, index, total, batch.len());
                    tracker.chunk_completed(&job.result).await;
                }
                Err(failure) => {
                    log_error!(
                        "Import {} chunk {} failed: {}",
                        job.run_id,
                        index,
                        failure.error
                    );
                    job.provisional_employers
                        .extend(failure.inserted_employers);
                    job.provisional_members.extend(failure.inserted_members);

                    self.audit
                        .record(
                            AuditEntry::new(job.run_id, job.clinic_id, AuditAction::BatchFailed)
                                .for_batch(index)
                                .with_details(json!({
                                    "batch": index,
                                    "rows": batch.len(),
                                    "error": failure.error.to_string(),
                                })),
                        )
                        .await;

                    return RunStatus::FailedPendingResume {
                        failed_chunk: index,
                        error: failure.error.to_string(),
                    };
                }
            }
        }

        RunStatus::Completed
    }

    async fn process_chunk(
        &self,
        job: &ImportJob,
        batch: &ImportBatch,
    ) -> Result<ChunkOutcome, ChunkFailure> {
        let records = &job.records[batch.range.clone()];
        let mut outcome = ChunkOutcome::default();

        for (offset, record) in records.iter().enumerate() {
            match record.action {
                ReconcileAction::Reject => {
                    let message = record.error_message.as_deref().unwrap_or("rejected");
                    outcome.errors.push(RowError::for_record(
                        batch.row_number(offset),
                        record,
                        reject_field(message),
                        message,
                    ));
                    outcome.rejected += 1;
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Failed, None));
                }
                ReconcileAction::Skip => {
                    outcome.skipped += 1;
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Skipped, record.matched_entity_id));
                }
                ReconcileAction::Create | ReconcileAction::Update => {}
            }
        }

        // Employers first so member rows can reference them
        let mut inserted_employers = Vec::new();
        let failed_orgs = match self
            .upsert_employers(job, records, &mut outcome, &mut inserted_employers)
            .await
        {
            Ok(failed) => failed,
            Err(error) => {
                return Err(ChunkFailure {
                    error,
                    inserted_employers,
                    inserted_members: Vec::new(),
                })
            }
        };

        let mut creates = Vec::new();
        let mut updates = Vec::new();
        for (offset, record) in records.iter().enumerate() {
            if !record.is_executable() {
                continue;
            }
            if let Some(reason) = failed_orgs.get(&record.canonical_org_key) {
                outcome.errors.push(RowError::for_record(
                    batch.row_number(offset),
                    record,
                    Some("org_key"),
                    format!("employer could not be saved: {}", reason),
                ));
                outcome
                    .annotations
                    .push((offset, ResultStatus::Failed, None));
                continue;
            }

            let employer_id = job
                .employer_ids
                .get(&record.canonical_org_key)
                .or_else(|| outcome.employer_ids.get(&record.canonical_org_key))
                .copied();

            match (record.action, record.matched_entity_id) {
                (ReconcileAction::Update, Some(member_id)) => updates.push((
                    offset,
                    member_id,
                    member_changes(record, employer_id, self.employer_name(job, record)),
                )),
                _ => creates.push((
                    offset,
                    new_member(job.clinic_id, record, employer_id, self.employer_name(job, record)),
                )),
            }
        }

        let mut inserted_members = Vec::new();
        if let Err(error) = self
            .create_members(job, batch, records, creates, &mut outcome, &mut inserted_members)
            .await
        {
            return Err(ChunkFailure {
                error,
                inserted_employers,
                inserted_members,
            });
        }

        self.update_members(batch, records, updates, &mut outcome)
            .await;

        outcome.errors.sort_by_key(|e| e.row);
        Ok(outcome)
    }

    /// Upsert the employers this chunk references that are not stored yet.
    ///
    /// Returns org keys whose employer could not be saved, with the reason.
    async fn upsert_employers(
        &self,
        job: &ImportJob,
        records: &[ReconciledRecord],
        outcome: &mut ChunkOutcome,
        inserted: &mut Vec<String>,
    ) -> AppResult<HashMap<String, String>> {
        let mut seen = HashSet::new();
        let rows: Vec<NewEmployer> = records
            .iter()
            .filter(|r| r.is_executable())
            .filter(|r| !job.employer_ids.contains_key(&r.canonical_org_key))
            .filter(|r| seen.insert(r.canonical_org_key.clone()))
            .map(|r| self.new_employer(job, r))
            .collect();

        let mut failed = HashMap::new();
        if rows.is_empty() {
            return Ok(failed);
        }

        let names: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.org_key.clone(), r.name.clone()))
            .collect();
        let results = match self.upsert_with_fallback(EntityRows::Employers(rows)).await {
            Ok(results) => results,
            Err(abort) => {
                inserted.extend(inserted_keys(abort.saved));
                return Err(abort.error);
            }
        };

        for ((key, name), result) in names.into_iter().zip(results) {
            match result {
                Ok(saved) => {
                    if saved.inserted {
                        inserted.push(key.clone());
                    }
                    if saved.inserted || job.provisional_employers.contains(&key) {
                        outcome.employers_created += 1;
                    }
                    outcome.employer_ids.insert(key.clone(), saved.id);
                    outcome.employer_names.insert(key, name);
                }
                Err(e) => {
                    log_warn!("Employer {} could not be saved: {}", key, e);
                    failed.insert(key, e.to_string());
                }
            }
        }

        Ok(failed)
    }

    async fn create_members(
        &self,
        job: &ImportJob,
        batch: &ImportBatch,
        records: &[ReconciledRecord],
        creates: Vec<(usize, NewMember)>,
        outcome: &mut ChunkOutcome,
        inserted: &mut Vec<String>,
    ) -> AppResult<()> {
        if creates.is_empty() {
            return Ok(());
        }

        let (offsets, rows): (Vec<usize>, Vec<NewMember>) = creates.into_iter().unzip();
        let results = match self.upsert_with_fallback(EntityRows::Members(rows)).await {
            Ok(results) => results,
            Err(abort) => {
                inserted.extend(inserted_keys(abort.saved));
                return Err(abort.error);
            }
        };

        for (offset, result) in offsets.into_iter().zip(results) {
            match result {
                Ok(saved)
                    if saved.inserted
                        || job
                            .provisional_members
                            .contains(&records[offset].canonical_person_key) =>
                {
                    outcome.members_created += 1;
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Created, Some(saved.id)));
                }
                Ok(saved) => {
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Unchanged, Some(saved.id)));
                }
                Err(e) => {
                    outcome.errors.push(RowError::for_record(
                        batch.row_number(offset),
                        &records[offset],
                        None,
                        e.to_string(),
                    ));
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Failed, None));
                }
            }
        }

        Ok(())
    }

    /// Per-record updates; a failed update never affects its siblings
    async fn update_members(
        &self,
        batch: &ImportBatch,
        records: &[ReconciledRecord],
        updates: Vec<(usize, Uuid, MemberChanges)>,
        outcome: &mut ChunkOutcome,
    ) {
        if updates.is_empty() {
            return;
        }

        let store = Arc::clone(&self.store);
        let results: Vec<(usize, Uuid, AppResult<()>)> = stream::iter(updates)
            .map(|(offset, member_id, changes)| {
                let store = Arc::clone(&store);
                async move {
                    let result = store.update_member(member_id, &changes).await;
                    (offset, member_id, result)
                }
            })
            .buffer_unordered(self.options.update_concurrency.max(1))
            .collect()
            .await;

        for (offset, member_id, result) in results {
            match result {
                Ok(()) => {
                    outcome.members_updated += 1;
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Updated, Some(member_id)));
                }
                Err(e) => {
                    outcome.errors.push(RowError::for_record(
                        batch.row_number(offset),
                        &records[offset],
                        None,
                        e.to_string(),
                    ));
                    outcome
                        .annotations
                        .push((offset, ResultStatus::Failed, None));
                }
            }
        }
    }

    /// One multi-row upsert, retried on transient errors.
    ///
    /// A transient error that outlives the retry budget aborts the chunk. Any
    /// other error switches to one upsert per row, whose individual failures
    /// are reported in the returned vector. The fallback itself aborts when a
    /// row hits a transient error or when no row at all could be written.
    async fn upsert_with_fallback(
        &self,
        rows: EntityRows,
    ) -> Result<Vec<AppResult<UpsertedEntity>>, UpsertAbort> {
        let table = rows.table();
        let keys = rows.keys();
        let operation = format!("upsert {} {}", rows.len(), table);

        let store = Arc::clone(&self.store);
        let attempt_rows = rows.clone();
        let batch_result = self
            .options
            .retry
            .run(&operation, || {
                let store = Arc::clone(&store);
                let rows = attempt_rows.clone();
                async move { store.upsert_batch(rows).await }
            })
            .await;

        match batch_result {
            Ok(saved) => Ok(match_by_key(&keys, saved)),
            Err(e) if e.is_transient() => Err(UpsertAbort {
                error: e,
                saved: Vec::new(),
            }),
            Err(e) => {
                log_warn!(
                    "Multi-row upsert into {} failed ({}); falling back to {} single-row upserts",
                    table,
                    e,
                    keys.len()
                );

                let mut results = Vec::with_capacity(keys.len());
                for (key, row) in keys.iter().zip(rows.split()) {
                    let single = self
                        .store
                        .upsert_batch(row)
                        .await
                        .and_then(|saved| {
                            match_by_key(std::slice::from_ref(key), saved)
                                .into_iter()
                                .next()
                                .unwrap_or_else(|| Err(missing_row(key)))
                        });
                    match &single {
                        Err(err) if err.is_transient() => {
                            log_warn!(
                                "Single-row upsert of {} into {} hit a transient error: {}",
                                key,
                                table,
                                err
                            );
                            return Err(UpsertAbort {
                                error: err.clone(),
                                saved: results.into_iter().flatten().collect(),
                            });
                        }
                        Err(err) => {
                            log_debug!("Single-row upsert of {} into {} failed: {}", key, table, err)
                        }
                        Ok(_) => {}
                    }
                    results.push(single);
                }

                if !results.is_empty() && results.iter().all(|r| r.is_err()) {
                    log_error!("No row of {} could be written to {}: {}", keys.len(), table, e);
                    return Err(UpsertAbort {
                        error: e,
                        saved: Vec::new(),
                    });
                }
                Ok(results)
            }
        }
    }

    fn employer_name(&self, job: &ImportJob, record: &ReconciledRecord) -> String {
        if let Some(name) = job.employer_names.get(&record.canonical_org_key) {
            return name.clone();
        }
        let details = job
            .enrichment
            .get(&record.canonical_org_key)
            .and_then(|d| d.as_ref());
        resolve_display_name(details, &record.candidate.org_name)
    }

    fn new_employer(&self, job: &ImportJob, record: &ReconciledRecord) -> NewEmployer {
        let details = job
            .enrichment
            .get(&record.canonical_org_key)
            .and_then(|d| d.as_ref());

        NewEmployer {
            clinic_id: job.clinic_id,
            org_key: record.canonical_org_key.clone(),
            name: resolve_display_name(details, &record.candidate.org_name),
            trade_name: details.and_then(|d| d.trade_name.clone()),
            address: details.map(|d| d.address.clone()).unwrap_or_default(),
            phone: details.and_then(|d| d.phone.clone()),
            email: details.and_then(|d| d.email.clone()),
            registration_status: details.and_then(|d| d.registration_status.clone()),
        }
    }
}

fn merge(job: &mut ImportJob, batch: &ImportBatch, outcome: ChunkOutcome) {
    let result = &mut job.result;
    result.members_created += outcome.members_created;
    result.members_updated += outcome.members_updated;
    result.employers_created += outcome.employers_created;
    result.skipped += outcome.skipped;
    result.rejected += outcome.rejected;
    result.errors.extend(outcome.errors);
    result.completed_batches.insert(batch.index);

    for key in outcome.employer_ids.keys() {
        job.provisional_employers.remove(key);
    }
    job.employer_ids.extend(outcome.employer_ids);
    job.employer_names.extend(outcome.employer_names);

    for (offset, status, entity_id) in outcome.annotations {
        if let Some(record) = job.records.get_mut(batch.range.start + offset) {
            job.provisional_members.remove(&record.canonical_person_key);
            record.result_status = status;
            record.entity_id = entity_id;
        }
    }
}

fn match_by_key(
    keys: &[String],
    saved: Vec<UpsertedEntity>,
) -> Vec<Result<UpsertedEntity, AppError>> {
    let mut by_key: HashMap<String, UpsertedEntity> = saved
        .into_iter()
        .map(|entity| (entity.natural_key.clone(), entity))
        .collect();

    keys.iter()
        .map(|key| by_key.remove(key).ok_or_else(|| missing_row(key)))
        .collect()
}

fn inserted_keys(saved: Vec<UpsertedEntity>) -> impl Iterator<Item = String> {
    saved
        .into_iter()
        .filter(|entity| entity.inserted)
        .map(|entity| entity.natural_key)
}

fn missing_row(key: &str) -> AppError {
    AppError::InternalError(format!("store returned no row for key {}", key))
}

fn reject_field(message: &str) -> Option<&'static str> {
    match message {
        INVALID_PERSON_IDENTIFIER => Some("person_key"),
        INVALID_ORGANIZATION_IDENTIFIER => Some("org_key"),
        INVALID_NAME => Some("person_name"),
        _ => None,
    }
}

fn new_member(
    clinic_id: Uuid,
    record: &ReconciledRecord,
    employer_id: Option<Uuid>,
    org_name: String,
) -> NewMember {
    let candidate = &record.candidate;
    NewMember {
        clinic_id,
        person_key: record.canonical_person_key.clone(),
        name: candidate.person_name.clone(),
        employer_id,
        org_key: record.canonical_org_key.clone(),
        org_name,
        role: candidate.role.clone(),
        join_date: candidate.join_date,
        address: candidate.address.clone(),
        phone: candidate.phone.clone(),
        email: candidate.email.clone(),
        birth_date: candidate.birth_date,
        gender: candidate.gender.clone(),
        marital_status: candidate.marital_status.clone(),
        mother_name: candidate.mother_name.clone(),
    }
}

/// Affiliation and membership are always (re)applied; other fields only when the document has them
fn member_changes(
    record: &ReconciledRecord,
    employer_id: Option<Uuid>,
    org_name: String,
) -> MemberChanges {
    let candidate = &record.candidate;
    MemberChanges {
        employer_id,
        org_key: Some(record.canonical_org_key.clone()),
        org_name: Some(org_name),
        is_member: Some(true),
        role: candidate.role.clone(),
        join_date: candidate.join_date,
        address: candidate.address.clone(),
        phone: candidate.phone.clone(),
        email: candidate.email.clone(),
        birth_date: candidate.birth_date,
        gender: candidate.gender.clone(),
        marital_status: candidate.marital_status.clone(),
        mother_name: candidate.mother_name.clone(),
    }
}

fn with_counts(mut details: serde_json::Value, result: &ImportResult) -> serde_json::Value {
    if let Some(map) = details.as_object_mut() {
        map.insert("members_created".into(), json!(result.members_created));
        map.insert("members_updated".into(), json!(result.members_updated));
        map.insert("employers_created".into(), json!(result.employers_created));
        map.insert("skipped".into(), json!(result.skipped));
        map.insert("rejected".into(), json!(result.rejected));
        map.insert("errors".into(), json!(result.errors.len()));
        map.insert(
            "completed_batches".into(),
            json!(result.completed_batches.len()),
        );
    }
    details
}
