pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{ErrorReport, ImportRun, ImportService};
pub use domain::{
    BatchExecutor, ChunkRetryPolicy, EntityRows, EntityStore, ImportEvent, ImportJob,
    ImportOptions, ImportResult, MemberChanges, NewEmployer, NewMember, RowError, RunStatus,
    UpsertedEntity,
};
pub use infrastructure::PgEntityStore;
