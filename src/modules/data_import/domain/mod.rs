pub mod entities;
pub mod options;
pub mod repository;
pub mod services;
pub mod types;

// Re-exports for easy access
pub use entities::{partition, ImportBatch, RunStatus};
pub use options::ImportOptions;
pub use repository::{EntityRows, EntityStore, MemberChanges, NewEmployer, NewMember, UpsertedEntity};
pub use services::import_components::{BatchExecutor, ChunkRetryPolicy, ImportJob, ProgressTracker};
pub use types::{ImportEvent, ImportResult, RowError};
