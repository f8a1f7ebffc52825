pub mod candidate;
pub mod natural_key;
pub mod reconciled;

pub use candidate::{Address, CandidateRecord};
pub use natural_key::{canonicalize, format_org_key, format_person_key};
pub use reconciled::{ReconcileAction, ReconciledRecord, ResultStatus};
