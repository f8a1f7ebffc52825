/// Import records module
///
/// Typed rows flowing through the pipeline: the extractor's `CandidateRecord`,
/// the canonical natural keys derived from it, and the `ReconciledRecord`
/// carrying the reconciliation decision and execution outcome.
pub mod domain;

pub use domain::{
    canonicalize, format_org_key, format_person_key, Address, CandidateRecord, ReconcileAction,
    ReconciledRecord, ResultStatus,
};
