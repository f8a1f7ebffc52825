/// Write side of the store used by the batch executor
///
/// Both operations must be idempotent per natural key: re-submitting a row
/// that is already applied updates it in place and reports `inserted = false`.
use crate::modules::records::Address;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployer {
    pub clinic_id: Uuid,
    pub org_key: String,
    pub name: String,
    pub trade_name: Option<String>,
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub registration_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub clinic_id: Uuid,
    pub person_key: String,
    pub name: String,
    pub employer_id: Option<Uuid>,
    pub org_key: String,
    pub org_name: String,
    pub role: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub mother_name: Option<String>,
}

/// Field deltas for an existing member; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberChanges {
    pub employer_id: Option<Uuid>,
    pub org_key: Option<String>,
    pub org_name: Option<String>,
    pub is_member: Option<bool>,
    pub role: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub mother_name: Option<String>,
}

/// Rows of one multi-row upsert, all of the same kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRows {
    Members(Vec<NewMember>),
    Employers(Vec<NewEmployer>),
}

impl EntityRows {
    pub fn len(&self) -> usize {
        match self {
            EntityRows::Members(rows) => rows.len(),
            EntityRows::Employers(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityRows::Members(_) => "members",
            EntityRows::Employers(_) => "employers",
        }
    }

    /// Natural keys in row order
    pub fn keys(&self) -> Vec<String> {
        match self {
            EntityRows::Members(rows) => rows.iter().map(|r| r.person_key.clone()).collect(),
            EntityRows::Employers(rows) => rows.iter().map(|r| r.org_key.clone()).collect(),
        }
    }

    /// One single-row batch per row, for per-record fallback
    pub fn split(self) -> Vec<EntityRows> {
        match self {
            EntityRows::Members(rows) => rows
                .into_iter()
                .map(|r| EntityRows::Members(vec![r]))
                .collect(),
            EntityRows::Employers(rows) => rows
                .into_iter()
                .map(|r| EntityRows::Employers(vec![r]))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertedEntity {
    pub natural_key: String,
    pub id: Uuid,
    /// False when the row already existed and was only re-applied
    pub inserted: bool,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert-or-update all rows in one round-trip, keyed on clinic + natural key
    async fn upsert_batch(&self, rows: EntityRows) -> AppResult<Vec<UpsertedEntity>>;

    async fn update_member(&self, id: Uuid, changes: &MemberChanges) -> AppResult<()>;
}
