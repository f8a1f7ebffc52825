pub mod batch_executor;
pub mod progress_tracker;
pub mod retry_policy;

// Re-export main types for public API
pub use batch_executor::{BatchExecutor, ImportJob};
pub use progress_tracker::{ProgressTracker, RunState};
pub use retry_policy::ChunkRetryPolicy;
