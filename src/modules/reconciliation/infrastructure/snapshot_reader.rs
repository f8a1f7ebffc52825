/// Diesel-based implementation of SnapshotReader
use crate::modules::reconciliation::domain::{
    EmployerSummary, ExistingEntitySnapshot, MemberSummary, SnapshotReader,
};
use crate::schema::{employers, members};
use crate::shared::errors::AppResult;
use crate::shared::infrastructure::database::Database;
use crate::shared::utils::logger::TimedOperation;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

/// Keys per `IN (...)` list, well below the PostgreSQL bind parameter limit
const KEYS_PER_QUERY: usize = 10_000;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = members)]
struct MemberSnapshotRow {
    id: Uuid,
    person_key: String,
    name: String,
    org_key: Option<String>,
    org_name: Option<String>,
    is_member: bool,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = employers)]
struct EmployerSnapshotRow {
    id: Uuid,
    org_key: String,
    name: String,
}

pub struct PgSnapshotReader {
    db: Arc<Database>,
}

impl PgSnapshotReader {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotReader for PgSnapshotReader {
    async fn load_snapshot(
        &self,
        clinic_id: Uuid,
        person_keys: &[String],
        org_keys: &[String],
    ) -> AppResult<ExistingEntitySnapshot> {
        let db = Arc::clone(&self.db);
        let person_keys = person_keys.to_vec();
        let org_keys = org_keys.to_vec();

        task::spawn_blocking(move || -> AppResult<ExistingEntitySnapshot> {
            let timer = TimedOperation::new("load existing entity snapshot");
            let mut conn = db.get_connection()?;
            let mut snapshot = ExistingEntitySnapshot::default();

            for keys in person_keys.chunks(KEYS_PER_QUERY) {
                let rows: Vec<MemberSnapshotRow> = members::table
                    .filter(members::clinic_id.eq(clinic_id))
                    .filter(members::person_key.eq_any(keys))
                    .select(MemberSnapshotRow::as_select())
                    .load(&mut conn)?;

                snapshot.members.extend(rows.into_iter().map(|row| {
                    (
                        row.person_key,
                        MemberSummary {
                            id: row.id,
                            name: row.name,
                            org_key: row.org_key,
                            org_name: row.org_name,
                            is_member: row.is_member,
                        },
                    )
                }));
            }

            for keys in org_keys.chunks(KEYS_PER_QUERY) {
                let rows: Vec<EmployerSnapshotRow> = employers::table
                    .filter(employers::clinic_id.eq(clinic_id))
                    .filter(employers::org_key.eq_any(keys))
                    .select(EmployerSnapshotRow::as_select())
                    .load(&mut conn)?;

                snapshot.employers.extend(rows.into_iter().map(|row| {
                    (
                        row.org_key,
                        EmployerSummary {
                            id: row.id,
                            name: row.name,
                        },
                    )
                }));
            }

            timer.finish(&format!(
                "{} members, {} employers",
                snapshot.members.len(),
                snapshot.employers.len()
            ));
            Ok(snapshot)
        })
        .await?
    }
}
