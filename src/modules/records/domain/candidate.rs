//! Candidate rows handed over by the document extractor
//!
//! A candidate is one row of an uploaded roster, already mapped onto the
//! fixed field set below. Identifiers are still free text at this point.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.number.is_none()
            && self.complement.is_none()
            && self.district.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
    }

    fn normalized(self) -> Self {
        Self {
            street: clean(self.street),
            number: clean(self.number),
            complement: clean(self.complement),
            district: clean(self.district),
            city: clean(self.city),
            state: clean(self.state),
            postal_code: clean(self.postal_code),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub person_name: String,
    pub person_id: String,
    pub org_name: String,
    pub org_id: String,
    pub role: Option<String>,
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub mother_name: Option<String>,
}

impl CandidateRecord {
    pub fn new(
        person_name: impl Into<String>,
        person_id: impl Into<String>,
        org_name: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            person_name: person_name.into(),
            person_id: person_id.into(),
            org_name: org_name.into(),
            org_id: org_id.into(),
            ..Default::default()
        }
    }

    /// Trim every text field and drop blank optionals.
    ///
    /// Runs once at the engine boundary; nothing downstream re-trims.
    pub fn normalized(self) -> Self {
        Self {
            person_name: collapse_whitespace(&self.person_name),
            person_id: self.person_id.trim().to_string(),
            org_name: collapse_whitespace(&self.org_name),
            org_id: self.org_id.trim().to_string(),
            role: clean(self.role),
            join_date: self.join_date,
            address: self.address.normalized(),
            phone: clean(self.phone),
            email: clean(self.email).map(|e| e.to_lowercase()),
            birth_date: self.birth_date,
            gender: clean(self.gender),
            marital_status: clean(self.marital_status),
            mother_name: clean(self.mother_name),
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
