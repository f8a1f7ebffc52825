use crate::modules::data_import::domain::{ImportResult, RowError};
use crate::modules::records::{format_org_key, format_person_key};
use crate::shared::errors::{AppError, AppResult};
use serde::Serialize;
use std::io::Write;

const HEADERS: [&str; 6] = ["row", "field", "message", "person_key", "org_key", "name"];

/// Row-level errors of a run, exportable for the operator to fix the source document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub errors: Vec<RowError>,
}

impl ErrorReport {
    pub fn from_result(result: &ImportResult) -> Self {
        let mut errors = result.errors.clone();
        errors.sort_by_key(|e| e.row);
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> AppResult<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(HEADERS)?;

        for error in &self.errors {
            let row = error.row.to_string();
            let person_key = format_person_key(&error.person_key);
            let org_key = format_org_key(&error.org_key);
            out.write_record([
                row.as_str(),
                error.field.as_deref().unwrap_or(""),
                error.message.as_str(),
                person_key.as_str(),
                org_key.as_str(),
                error.name.as_str(),
            ])?;
        }

        out.flush()
            .map_err(|e| AppError::InternalError(format!("Failed to flush error report: {}", e)))
    }

    pub fn to_csv(&self) -> AppResult<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| AppError::SerializationError(format!("Error report is not UTF-8: {}", e)))
    }
}
