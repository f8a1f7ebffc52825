use crate::modules::audit::{AuditRecorder, PgAuditSink};
use crate::modules::data_import::domain::services::import_components::{
    BatchExecutor, ImportJob, ProgressTracker, RunState,
};
use crate::modules::data_import::domain::{
    EntityStore, ImportEvent, ImportOptions, ImportResult, RunStatus,
};
use crate::modules::data_import::infrastructure::PgEntityStore;
use crate::modules::enrichment::{EnrichmentService, OrgDetails, RegistryClient};
use crate::modules::reconciliation::application::{
    ReconciliationEngine, ReconciliationOutcome, ReconciliationSummary,
};
use crate::modules::reconciliation::domain::{ExistingEntitySnapshot, SnapshotReader};
use crate::modules::reconciliation::infrastructure::PgSnapshotReader;
use crate::modules::records::CandidateRecord;
use crate::shared::config::ImportConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::Database;
use crate::shared::utils::logger::TimedOperation;
use crate::{log_info, log_warn};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A started (or resumed) run and its event stream.
///
/// The stream yields one `Progress` per completed chunk and ends with exactly
/// one terminal event.
#[derive(Debug)]
pub struct ImportRun {
    pub run_id: Uuid,
    pub events: UnboundedReceiver<ImportEvent>,
}

struct RunHandle {
    job: Arc<Mutex<ImportJob>>,
    state: Arc<RwLock<RunState>>,
    cancel: CancellationToken,
    options: ImportOptions,
}

/// Import service - entry point for previews, runs and run control
#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn EntityStore>,
    snapshots: Arc<dyn SnapshotReader>,
    enrichment: Option<EnrichmentService>,
    audit: AuditRecorder,
    runs: Arc<DashMap<Uuid, RunHandle>>,
}

impl ImportService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        snapshots: Arc<dyn SnapshotReader>,
        enrichment: Option<EnrichmentService>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            store,
            snapshots,
            enrichment,
            audit,
            runs: Arc::new(DashMap::new()),
        }
    }

    /// Wire the PostgreSQL adapters and the HTTP registry client from configuration
    pub fn with_postgres(db: Arc<Database>, config: &ImportConfig) -> AppResult<Self> {
        let registry = RegistryClient::new(&config.registry)?;

        Ok(Self::new(
            Arc::new(PgEntityStore::new(Arc::clone(&db))),
            Arc::new(PgSnapshotReader::new(Arc::clone(&db))),
            Some(EnrichmentService::new(Arc::new(registry))),
            AuditRecorder::new(Some(Arc::new(PgAuditSink::new(db)))),
        ))
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    /// Reconcile without executing anything
    pub async fn preview(
        &self,
        clinic_id: Uuid,
        records: Vec<CandidateRecord>,
    ) -> AppResult<ReconciliationSummary> {
        ensure_runnable(clinic_id, &records)?;
        let (outcome, snapshot) = self.reconcile(clinic_id, records).await?;
        Ok(ReconciliationEngine::summarize(&outcome, &snapshot))
    }

    pub async fn start_import(
        &self,
        clinic_id: Uuid,
        records: Vec<CandidateRecord>,
        options: ImportOptions,
    ) -> AppResult<ImportRun> {
        ensure_runnable(clinic_id, &records)?;
        options.validate()?;

        let timer = TimedOperation::new("prepare import");
        let (outcome, snapshot) = self.reconcile(clinic_id, records).await?;
        let enrichment = self.enrich(&outcome, &snapshot, &options).await;

        let run_id = Uuid::new_v4();
        let job = ImportJob::new(
            run_id,
            clinic_id,
            outcome,
            &snapshot,
            enrichment,
            options.chunk_size,
        );
        timer.finish(&format!(
            "run {}: {} records in {} chunks",
            run_id,
            job.records.len(),
            job.batches.len()
        ));

        let mut state = RunState::new(job.result.clone());
        state.status = RunStatus::Running;
        let state = Arc::new(RwLock::new(state));
        let job = Arc::new(Mutex::new(job));
        let cancel = CancellationToken::new();

        self.runs.insert(
            run_id,
            RunHandle {
                job: Arc::clone(&job),
                state: Arc::clone(&state),
                cancel: cancel.clone(),
                options: options.clone(),
            },
        );

        let events = self.spawn_run(job, state, cancel, options, 0);
        Ok(ImportRun { run_id, events })
    }

    /// Request cancellation; the run stops at the next chunk boundary
    pub fn cancel(&self, run_id: Uuid) -> AppResult<()> {
        let handle = self.handle(run_id)?;
        handle.cancel.cancel();
        log_info!("Cancellation requested for import {}", run_id);
        Ok(())
    }

    /// Continue a cancelled or failed run from its resume point
    pub async fn resume(&self, run_id: Uuid) -> AppResult<ImportRun> {
        let (job, state, options) = {
            let handle = self.handle(run_id)?;
            (
                Arc::clone(&handle.job),
                Arc::clone(&handle.state),
                handle.options.clone(),
            )
        };

        let from_chunk = {
            let mut state = state.write().await;
            let from_chunk = state.status.resume_point().ok_or_else(|| {
                AppError::InvalidOperation(format!(
                    "import {} cannot be resumed while {}",
                    run_id, state.status
                ))
            })?;
            state.status = RunStatus::Running;
            from_chunk
        };

        let cancel = CancellationToken::new();
        if let Some(mut handle) = self.runs.get_mut(&run_id) {
            handle.cancel = cancel.clone();
        }

        log_info!("Resuming import {} from chunk {}", run_id, from_chunk);
        let events = self.spawn_run(job, state, cancel, options, from_chunk);
        Ok(ImportRun { run_id, events })
    }

    pub async fn status(&self, run_id: Uuid) -> AppResult<RunStatus> {
        let state = self.state(run_id)?;
        let status = state.read().await.status.clone();
        Ok(status)
    }

    /// Latest result snapshot of the run
    pub async fn result(&self, run_id: Uuid) -> AppResult<ImportResult> {
        let state = self.state(run_id)?;
        let result = state.read().await.result.clone();
        Ok(result)
    }

    /// Drop a run that is no longer executing
    pub async fn forget(&self, run_id: Uuid) -> AppResult<()> {
        if self.status(run_id).await? == RunStatus::Running {
            return Err(AppError::InvalidOperation(format!(
                "import {} is still running",
                run_id
            )));
        }
        self.runs.remove(&run_id);
        Ok(())
    }

    pub fn run_ids(&self) -> Vec<Uuid> {
        self.runs.iter().map(|entry| *entry.key()).collect()
    }

    fn handle(
        &self,
        run_id: Uuid,
    ) -> AppResult<dashmap::mapref::one::Ref<'_, Uuid, RunHandle>> {
        self.runs
            .get(&run_id)
            .ok_or_else(|| AppError::NotFound(format!("import run {} not found", run_id)))
    }

    fn state(&self, run_id: Uuid) -> AppResult<Arc<RwLock<RunState>>> {
        Ok(Arc::clone(&self.handle(run_id)?.state))
    }

    fn spawn_run(
        &self,
        job: Arc<Mutex<ImportJob>>,
        state: Arc<RwLock<RunState>>,
        cancel: CancellationToken,
        options: ImportOptions,
        from_chunk: usize,
    ) -> UnboundedReceiver<ImportEvent> {
        let (sender, events) = mpsc::unbounded_channel();
        let tracker = ProgressTracker::new(Some(sender)).with_state(state);
        let executor = BatchExecutor::new(Arc::clone(&self.store), self.audit.clone(), options);

        tokio::spawn(async move {
            let mut job = job.lock().await;
            executor.run(&mut job, from_chunk, &cancel, &tracker).await
        });

        events
    }

    async fn reconcile(
        &self,
        clinic_id: Uuid,
        records: Vec<CandidateRecord>,
    ) -> AppResult<(ReconciliationOutcome, ExistingEntitySnapshot)> {
        let (person_keys, org_keys) = ReconciliationEngine::snapshot_keys(&records);
        let snapshot = self
            .snapshots
            .load_snapshot(clinic_id, &person_keys, &org_keys)
            .await?;
        let outcome = ReconciliationEngine::reconcile(records, &snapshot);
        Ok((outcome, snapshot))
    }

    /// Registry data for organizations the run will create, looked up once per run
    async fn enrich(
        &self,
        outcome: &ReconciliationOutcome,
        snapshot: &ExistingEntitySnapshot,
        options: &ImportOptions,
    ) -> HashMap<String, Option<OrgDetails>> {
        let service = match (&self.enrichment, options.enable_enrichment) {
            (Some(service), true) => service,
            (None, true) => {
                log_warn!("Enrichment requested but no registry is configured");
                return HashMap::new();
            }
            _ => return HashMap::new(),
        };

        let keys = outcome.new_org_keys(snapshot);
        service
            .batch_lookup_organizations(
                &keys,
                options.enrichment_concurrency,
                options.enrichment_timeout,
            )
            .await
    }
}

fn ensure_runnable(clinic_id: Uuid, records: &[CandidateRecord]) -> AppResult<()> {
    if clinic_id.is_nil() {
        return Err(AppError::SetupError("clinic id is required".to_string()));
    }
    if records.is_empty() {
        return Err(AppError::SetupError("no records to import".to_string()));
    }
    Ok(())
}
