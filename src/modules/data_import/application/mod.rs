pub mod error_report;
pub mod service;

pub use error_report::ErrorReport;
pub use service::{ImportRun, ImportService};
