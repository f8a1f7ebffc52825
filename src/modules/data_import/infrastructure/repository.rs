/// Diesel-based implementation of EntityStore
///
/// Upserts run in one transaction: the natural keys already present are read
/// first so each returned row can report whether it was inserted.
use super::models::{MemberChangeset, NewEmployerRow, NewMemberRow};
use crate::log_debug;
use crate::modules::data_import::domain::{
    EntityRows, EntityStore, MemberChanges, NewEmployer, NewMember, UpsertedEntity,
};
use crate::schema::{employers, members};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::database::Database;
use crate::shared::utils::logger::LogContext;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

pub struct PgEntityStore {
    db: Arc<Database>,
}

impl PgEntityStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn upsert_members(
        conn: &mut PgConnection,
        rows: Vec<NewMember>,
    ) -> AppResult<Vec<UpsertedEntity>> {
        let clinics: Vec<Uuid> = distinct(rows.iter().map(|r| r.clinic_id));
        let keys: Vec<String> = rows.iter().map(|r| r.person_key.clone()).collect();

        let existing: HashSet<(Uuid, String)> = members::table
            .filter(members::clinic_id.eq_any(&clinics))
            .filter(members::person_key.eq_any(&keys))
            .select((members::clinic_id, members::person_key))
            .load::<(Uuid, String)>(conn)?
            .into_iter()
            .collect();

        let new_rows: Vec<NewMemberRow> = rows.into_iter().map(NewMemberRow::from).collect();
        let saved: Vec<(Uuid, Uuid, String)> = diesel::insert_into(members::table)
            .values(&new_rows)
            .on_conflict((members::clinic_id, members::person_key))
            .do_update()
            .set((
                members::name.eq(excluded(members::name)),
                members::employer_id.eq(excluded(members::employer_id)),
                members::org_key.eq(excluded(members::org_key)),
                members::org_name.eq(excluded(members::org_name)),
                members::is_member.eq(excluded(members::is_member)),
                members::updated_at.eq(chrono::Utc::now()),
            ))
            .returning((members::id, members::clinic_id, members::person_key))
            .get_results(conn)?;

        Ok(saved
            .into_iter()
            .map(|(id, clinic_id, person_key)| UpsertedEntity {
                inserted: !existing.contains(&(clinic_id, person_key.clone())),
                natural_key: person_key,
                id,
            })
            .collect())
    }

    fn upsert_employers(
        conn: &mut PgConnection,
        rows: Vec<NewEmployer>,
    ) -> AppResult<Vec<UpsertedEntity>> {
        let clinics: Vec<Uuid> = distinct(rows.iter().map(|r| r.clinic_id));
        let keys: Vec<String> = rows.iter().map(|r| r.org_key.clone()).collect();

        let existing: HashSet<(Uuid, String)> = employers::table
            .filter(employers::clinic_id.eq_any(&clinics))
            .filter(employers::org_key.eq_any(&keys))
            .select((employers::clinic_id, employers::org_key))
            .load::<(Uuid, String)>(conn)?
            .into_iter()
            .collect();

        let new_rows: Vec<NewEmployerRow> = rows.into_iter().map(NewEmployerRow::from).collect();
        let saved: Vec<(Uuid, Uuid, String)> = diesel::insert_into(employers::table)
            .values(&new_rows)
            .on_conflict((employers::clinic_id, employers::org_key))
            .do_update()
            .set((
                employers::name.eq(excluded(employers::name)),
                employers::updated_at.eq(chrono::Utc::now()),
            ))
            .returning((employers::id, employers::clinic_id, employers::org_key))
            .get_results(conn)?;

        Ok(saved
            .into_iter()
            .map(|(id, clinic_id, org_key)| UpsertedEntity {
                inserted: !existing.contains(&(clinic_id, org_key.clone())),
                natural_key: org_key,
                id,
            })
            .collect())
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn upsert_batch(&self, rows: EntityRows) -> AppResult<Vec<UpsertedEntity>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let table = rows.table();
        let count = rows.len();
        let start = std::time::Instant::now();
        LogContext::db_operation("upsert", table, None);

        let db = Arc::clone(&self.db);
        let saved = task::spawn_blocking(move || -> AppResult<Vec<UpsertedEntity>> {
            let mut conn = db.get_connection()?;
            conn.transaction::<_, AppError, _>(|conn| match rows {
                EntityRows::Members(rows) => Self::upsert_members(conn, rows),
                EntityRows::Employers(rows) => Self::upsert_employers(conn, rows),
            })
        })
        .await??;

        log_debug!("Upserted {} rows into {}", count, table);
        LogContext::db_operation(
            "upsert",
            table,
            Some(start.elapsed().as_millis() as u64),
        );
        Ok(saved)
    }

    async fn update_member(&self, id: Uuid, changes: &MemberChanges) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let changeset = MemberChangeset::from(changes);

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = db.get_connection()?;
            let updated = diesel::update(members::table.find(id))
                .set(&changeset)
                .execute(&mut conn)?;

            if updated == 0 {
                return Err(AppError::NotFound(format!("member {} not found", id)));
            }
            Ok(())
        })
        .await?
    }
}

fn distinct(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let set: HashSet<Uuid> = ids.collect();
    set.into_iter().collect()
}
