/// Diesel-based implementation of AuditSink
use super::models::NewAuditLogEntry;
use crate::modules::audit::domain::{AuditEntry, AuditSink};
use crate::schema::import_audit_log;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::database::Database;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use tokio::task;

pub struct PgAuditSink {
    db: Arc<Database>,
}

impl PgAuditSink {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn persist(&self, entry: &AuditEntry) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let row = NewAuditLogEntry::from(entry);

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = db.get_connection()?;
            diesel::insert_into(import_audit_log::table)
                .values(&row)
                .on_conflict(import_audit_log::id)
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| AppError::DatabaseError(format!("Failed to write audit entry: {}", e)))?;
            Ok(())
        })
        .await?
    }
}
