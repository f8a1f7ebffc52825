/// Reconciliation of candidate records against the persisted entities
///
/// Decides per record whether the import creates, updates, skips or rejects
/// it, using a snapshot of the store taken once per run.
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{ReconciliationEngine, ReconciliationOutcome, ReconciliationSummary};
pub use domain::{EmployerSummary, ExistingEntitySnapshot, MemberSummary, SnapshotReader};
pub use infrastructure::PgSnapshotReader;
