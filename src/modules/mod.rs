pub mod audit;
pub mod data_import;
pub mod enrichment;
pub mod reconciliation;
pub mod records;
