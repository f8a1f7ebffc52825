/// Diesel models for the import_audit_log table
use crate::modules::audit::domain::{AuditActionDb, AuditEntry};
use crate::schema::import_audit_log;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Insertable, Debug)]
#[diesel(table_name = import_audit_log)]
pub struct NewAuditLogEntry {
    pub id: Uuid,
    pub run_id: Uuid,
    pub clinic_id: Uuid,
    pub action: AuditActionDb,
    pub entity_kind: String,
    pub entity_id: Option<Uuid>,
    pub details: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl From<&AuditEntry> for NewAuditLogEntry {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id,
            run_id: entry.run_id,
            clinic_id: entry.clinic_id,
            action: entry.action.into(),
            entity_kind: entry.entity_kind.to_string(),
            entity_id: entry.entity_id,
            details: entry.details.clone(),
            recorded_at: entry.recorded_at,
        }
    }
}
