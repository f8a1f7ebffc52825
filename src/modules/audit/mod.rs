/// Import audit trail
///
/// Every run invocation leaves one start entry, one entry per processed
/// batch and exactly one terminal entry.
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::AuditRecorder;
pub use domain::{batch_entity_id, AuditAction, AuditEntityKind, AuditEntry, AuditSink};
pub use infrastructure::PgAuditSink;
