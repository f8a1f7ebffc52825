pub mod repository;
pub mod rules;
pub mod snapshot;

pub use repository::SnapshotReader;
pub use rules::{decide, INVALID_NAME, INVALID_ORGANIZATION_IDENTIFIER, INVALID_PERSON_IDENTIFIER};
pub use snapshot::{EmployerSummary, ExistingEntitySnapshot, MemberSummary};
