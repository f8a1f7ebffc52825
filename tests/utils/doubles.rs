/// In-memory test doubles for the store, snapshot and audit ports
///
/// `InMemoryEntityStore` is idempotent on natural key like the real store and
/// lets tests script failures per key.
use async_trait::async_trait;
use clinic_import::modules::audit::{AuditEntry, AuditSink};
use clinic_import::modules::data_import::domain::{
    EntityRows, EntityStore, MemberChanges, UpsertedEntity,
};
use clinic_import::modules::reconciliation::domain::{
    EmployerSummary, ExistingEntitySnapshot, MemberSummary, SnapshotReader,
};
use clinic_import::shared::errors::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMember {
    pub id: Uuid,
    pub name: String,
    pub employer_id: Option<Uuid>,
    pub org_key: Option<String>,
    pub org_name: Option<String>,
    pub is_member: bool,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEmployer {
    pub id: Uuid,
    pub name: String,
}

#[derive(Default)]
struct Script {
    /// Any upsert containing one of these keys fails with a non-transient error
    failing_keys: HashSet<String>,
    /// Any upsert containing one of these keys fails with a transient error
    transient_keys: HashSet<String>,
    /// Next N upsert calls fail with a transient error
    transient_calls: usize,
    /// These keys fail with a transient error when upserted on their own
    flaky_single_keys: HashSet<String>,
    /// Every upsert and update fails with a non-transient error
    reject_all_writes: bool,
    failing_updates: HashSet<Uuid>,
    /// Cancel this token when the key is upserted
    cancel_on: Option<(String, CancellationToken)>,
}

#[derive(Default)]
pub struct InMemoryEntityStore {
    members: Mutex<HashMap<String, StoredMember>>,
    employers: Mutex<HashMap<String, StoredEmployer>>,
    script: Mutex<Script>,
    upsert_calls: AtomicUsize,
    update_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn seed_member(
        &self,
        person_key: &str,
        org_key: &str,
        org_name: Option<&str>,
        is_member: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.members.lock().unwrap().insert(
            person_key.to_string(),
            StoredMember {
                id,
                name: "Seeded Member".to_string(),
                employer_id: None,
                org_key: Some(org_key.to_string()),
                org_name: org_name.map(String::from),
                is_member,
                email: None,
            },
        );
        id
    }

    pub fn seed_employer(&self, org_key: &str, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.employers.lock().unwrap().insert(
            org_key.to_string(),
            StoredEmployer {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn fail_key(&self, key: &str) {
        self.script.lock().unwrap().failing_keys.insert(key.to_string());
    }

    pub fn fail_key_transiently(&self, key: &str) {
        self.script
            .lock()
            .unwrap()
            .transient_keys
            .insert(key.to_string());
    }

    pub fn fail_next_upserts(&self, calls: usize) {
        self.script.lock().unwrap().transient_calls = calls;
    }

    pub fn fail_key_transiently_alone(&self, key: &str) {
        self.script
            .lock()
            .unwrap()
            .flaky_single_keys
            .insert(key.to_string());
    }

    pub fn fail_all_writes(&self) {
        self.script.lock().unwrap().reject_all_writes = true;
    }

    pub fn fail_update(&self, member_id: Uuid) {
        self.script.lock().unwrap().failing_updates.insert(member_id);
    }

    pub fn cancel_when_upserting(&self, key: &str, token: CancellationToken) {
        self.script.lock().unwrap().cancel_on = Some((key.to_string(), token));
    }

    pub fn clear_failures(&self) {
        let mut script = self.script.lock().unwrap();
        script.failing_keys.clear();
        script.transient_keys.clear();
        script.transient_calls = 0;
        script.flaky_single_keys.clear();
        script.reject_all_writes = false;
        script.failing_updates.clear();
    }

    pub fn member(&self, person_key: &str) -> Option<StoredMember> {
        self.members.lock().unwrap().get(person_key).cloned()
    }

    pub fn employer(&self, org_key: &str) -> Option<StoredEmployer> {
        self.employers.lock().unwrap().get(org_key).cloned()
    }

    pub fn member_count(&self) -> usize {
        self.members.lock().unwrap().len()
    }

    pub fn employer_count(&self) -> usize {
        self.employers.lock().unwrap().len()
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn check_script(&self, keys: &[String]) -> AppResult<()> {
        let mut script = self.script.lock().unwrap();

        if let Some((key, token)) = &script.cancel_on {
            if keys.contains(key) {
                token.cancel();
            }
        }
        if script.reject_all_writes {
            return Err(permission_denied());
        }
        if script.transient_calls > 0 {
            script.transient_calls -= 1;
            return Err(AppError::DatabaseError(
                "connection reset by peer".to_string(),
            ));
        }
        if keys.len() == 1 && script.flaky_single_keys.contains(&keys[0]) {
            return Err(AppError::DatabaseError(
                "connection reset by peer".to_string(),
            ));
        }
        if let Some(key) = keys.iter().find(|k| script.transient_keys.contains(*k)) {
            return Err(AppError::Timeout(format!("statement timeout upserting {}", key)));
        }
        if let Some(key) = keys.iter().find(|k| script.failing_keys.contains(*k)) {
            return Err(AppError::DatabaseError(format!(
                "value too long for type character varying ({})",
                key
            )));
        }
        Ok(())
    }
}

fn permission_denied() -> AppError {
    AppError::DatabaseError("permission denied for table members".to_string())
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn upsert_batch(&self, rows: EntityRows) -> AppResult<Vec<UpsertedEntity>> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_script(&rows.keys())?;

        let saved = match rows {
            EntityRows::Members(rows) => {
                let mut members = self.members.lock().unwrap();
                rows.into_iter()
                    .map(|row| {
                        let inserted = !members.contains_key(&row.person_key);
                        let entry = members
                            .entry(row.person_key.clone())
                            .or_insert_with(|| StoredMember {
                                id: Uuid::new_v4(),
                                name: row.name.clone(),
                                employer_id: None,
                                org_key: None,
                                org_name: None,
                                is_member: true,
                                email: None,
                            });
                        entry.name = row.name;
                        entry.employer_id = row.employer_id;
                        entry.org_key = Some(row.org_key);
                        entry.org_name = Some(row.org_name);
                        entry.is_member = true;
                        entry.email = row.email;
                        UpsertedEntity {
                            natural_key: row.person_key,
                            id: entry.id,
                            inserted,
                        }
                    })
                    .collect()
            }
            EntityRows::Employers(rows) => {
                let mut employers = self.employers.lock().unwrap();
                rows.into_iter()
                    .map(|row| {
                        let inserted = !employers.contains_key(&row.org_key);
                        let entry = employers
                            .entry(row.org_key.clone())
                            .or_insert_with(|| StoredEmployer {
                                id: Uuid::new_v4(),
                                name: row.name.clone(),
                            });
                        entry.name = row.name;
                        UpsertedEntity {
                            natural_key: row.org_key,
                            id: entry.id,
                            inserted,
                        }
                    })
                    .collect()
            }
        };

        Ok(saved)
    }

    async fn update_member(&self, id: Uuid, changes: &MemberChanges) -> AppResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.script.lock().unwrap().reject_all_writes {
            return Err(permission_denied());
        }
        if self.script.lock().unwrap().failing_updates.contains(&id) {
            return Err(AppError::DatabaseError(format!(
                "deadlock detected updating {}",
                id
            )));
        }

        let mut members = self.members.lock().unwrap();
        let member = members
            .values_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound(format!("member {} not found", id)))?;

        if changes.employer_id.is_some() {
            member.employer_id = changes.employer_id;
        }
        if let Some(org_key) = &changes.org_key {
            member.org_key = Some(org_key.clone());
        }
        if let Some(org_name) = &changes.org_name {
            member.org_name = Some(org_name.clone());
        }
        if let Some(is_member) = changes.is_member {
            member.is_member = is_member;
        }
        if let Some(email) = &changes.email {
            member.email = Some(email.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotReader for InMemoryEntityStore {
    async fn load_snapshot(
        &self,
        _clinic_id: Uuid,
        person_keys: &[String],
        org_keys: &[String],
    ) -> AppResult<ExistingEntitySnapshot> {
        let members = self.members.lock().unwrap();
        let employers = self.employers.lock().unwrap();
        let mut snapshot = ExistingEntitySnapshot::default();

        for key in person_keys {
            if let Some(m) = members.get(key) {
                snapshot.members.insert(
                    key.clone(),
                    MemberSummary {
                        id: m.id,
                        name: m.name.clone(),
                        org_key: m.org_key.clone(),
                        org_name: m.org_name.clone(),
                        is_member: m.is_member,
                    },
                );
            }
        }
        for key in org_keys {
            if let Some(e) = employers.get(key) {
                snapshot.employers.insert(
                    key.clone(),
                    EmployerSummary {
                        id: e.id,
                        name: e.name.clone(),
                    },
                );
            }
        }

        Ok(snapshot)
    }
}

/// Snapshot reader that always fails, for setup error paths
pub struct UnavailableSnapshotReader;

#[async_trait]
impl SnapshotReader for UnavailableSnapshotReader {
    async fn load_snapshot(
        &self,
        _clinic_id: Uuid,
        _person_keys: &[String],
        _org_keys: &[String],
    ) -> AppResult<ExistingEntitySnapshot> {
        Err(AppError::DatabaseError("could not connect to server".to_string()))
    }
}

/// Audit sink whose durable writes always fail
#[derive(Default)]
pub struct FailingAuditSink {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn persist(&self, _entry: &AuditEntry) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::DatabaseError("audit table is locked".to_string()))
    }
}
