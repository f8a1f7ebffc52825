pub mod engine;

pub use engine::{ReconciliationEngine, ReconciliationOutcome, ReconciliationSummary};
