pub mod modules;
mod schema;
pub mod shared;

pub use modules::audit::{AuditAction, AuditEntry, AuditRecorder, AuditSink};
pub use modules::data_import::{
    ErrorReport, ImportEvent, ImportOptions, ImportResult, ImportRun, ImportService, RunStatus,
};
pub use modules::enrichment::{EnrichmentService, OrganizationRegistry, RegistryClient};
pub use modules::reconciliation::{ReconciliationEngine, ReconciliationSummary, SnapshotReader};
pub use modules::records::{CandidateRecord, ReconcileAction, ReconciledRecord};
pub use shared::config::ImportConfig;
pub use shared::errors::{AppError, AppResult};
pub use shared::infrastructure::Database;
pub use shared::utils::logger::init_logger;
