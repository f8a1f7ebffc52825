/// Diesel models for the members and employers tables
use crate::modules::data_import::domain::{MemberChanges, NewEmployer, NewMember};
use crate::schema::{employers, members};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = employers)]
pub struct NewEmployerRow {
    pub clinic_id: Uuid,
    pub org_key: String,
    pub name: String,
    pub trade_name: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub registration_status: Option<String>,
}

impl From<NewEmployer> for NewEmployerRow {
    fn from(employer: NewEmployer) -> Self {
        let address = employer.address;
        Self {
            clinic_id: employer.clinic_id,
            org_key: employer.org_key,
            name: employer.name,
            trade_name: employer.trade_name,
            street: address.street,
            number: address.number,
            complement: address.complement,
            district: address.district,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            phone: employer.phone,
            email: employer.email,
            registration_status: employer.registration_status,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = members)]
pub struct NewMemberRow {
    pub clinic_id: Uuid,
    pub person_key: String,
    pub name: String,
    pub employer_id: Option<Uuid>,
    pub org_key: Option<String>,
    pub org_name: Option<String>,
    pub is_member: bool,
    pub role: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub mother_name: Option<String>,
}

impl From<NewMember> for NewMemberRow {
    fn from(member: NewMember) -> Self {
        let address = member.address;
        Self {
            clinic_id: member.clinic_id,
            person_key: member.person_key,
            name: member.name,
            employer_id: member.employer_id,
            org_key: Some(member.org_key),
            org_name: Some(member.org_name),
            is_member: true,
            role: member.role,
            join_date: member.join_date,
            street: address.street,
            number: address.number,
            complement: address.complement,
            district: address.district,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            phone: member.phone,
            email: member.email,
            birth_date: member.birth_date,
            gender: member.gender,
            marital_status: member.marital_status,
            mother_name: member.mother_name,
        }
    }
}

/// Partial update of a member; `None` fields are left out of the UPDATE
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = members)]
pub struct MemberChangeset {
    pub employer_id: Option<Uuid>,
    pub org_key: Option<String>,
    pub org_name: Option<String>,
    pub is_member: Option<bool>,
    pub role: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub mother_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&MemberChanges> for MemberChangeset {
    fn from(changes: &MemberChanges) -> Self {
        let address = changes.address.clone();
        Self {
            employer_id: changes.employer_id,
            org_key: changes.org_key.clone(),
            org_name: changes.org_name.clone(),
            is_member: changes.is_member,
            role: changes.role.clone(),
            join_date: changes.join_date,
            street: address.street,
            number: address.number,
            complement: address.complement,
            district: address.district,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            phone: changes.phone.clone(),
            email: changes.email.clone(),
            birth_date: changes.birth_date,
            gender: changes.gender.clone(),
            marital_status: changes.marital_status.clone(),
            mother_name: changes.mother_name.clone(),
            updated_at: Utc::now(),
        }
    }
}
