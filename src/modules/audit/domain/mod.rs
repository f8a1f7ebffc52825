pub mod entities;
pub mod repository;
pub mod value_objects;

pub use entities::{batch_entity_id, AuditAction, AuditEntityKind, AuditEntry};
pub use repository::AuditSink;
pub use value_objects::AuditActionDb;
