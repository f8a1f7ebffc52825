/// Test data factories using builder pattern
///
/// Provides convenient methods to create candidate rows with sensible defaults
use chrono::NaiveDate;
use clinic_import::modules::records::{Address, CandidateRecord};

pub const ACME_KEY: &str = "11.111.111/0001-11";
pub const GLOBEX_KEY: &str = "22.222.222/0001-22";

pub struct CandidateFactory {
    person_name: String,
    person_id: String,
    org_name: String,
    org_id: String,
    role: Option<String>,
    join_date: Option<NaiveDate>,
    city: Option<String>,
    email: Option<String>,
}

impl Default for CandidateFactory {
    fn default() -> Self {
        Self {
            person_name: "Ana Souza".to_string(),
            person_id: "111.222.333-44".to_string(),
            org_name: "Acme Comércio".to_string(),
            org_id: ACME_KEY.to_string(),
            role: None,
            join_date: None,
            city: None,
            email: None,
        }
    }
}

impl CandidateFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate with a unique, valid person key derived from `n`
    pub fn numbered(n: usize) -> Self {
        Self::default()
            .person(&format!("Member {:04}", n), &format!("{:011}", n + 1))
    }

    pub fn person(mut self, name: &str, id: &str) -> Self {
        self.person_name = name.to_string();
        self.person_id = id.to_string();
        self
    }

    pub fn org(mut self, name: &str, id: &str) -> Self {
        self.org_name = name.to_string();
        self.org_id = id.to_string();
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn joined(mut self, date: NaiveDate) -> Self {
        self.join_date = Some(date);
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn build(self) -> CandidateRecord {
        CandidateRecord {
            role: self.role,
            join_date: self.join_date,
            address: Address {
                city: self.city,
                ..Default::default()
            },
            email: self.email,
            ..CandidateRecord::new(self.person_name, self.person_id, self.org_name, self.org_id)
        }
    }

    /// `count` distinct valid candidates, all under the same organization
    pub fn many(count: usize) -> Vec<CandidateRecord> {
        (0..count).map(|n| Self::numbered(n).build()).collect()
    }
}
