use super::dto::RegistryOrganizationResponse;
use crate::modules::enrichment::domain::OrgDetails;
use crate::modules::records::Address;

pub struct RegistryMapper;

impl RegistryMapper {
    /// Map a registry payload to domain details; logically failed payloads map to `None`
    pub fn to_domain(org_key: &str, response: RegistryOrganizationResponse) -> Option<OrgDetails> {
        if response.is_error() {
            return None;
        }

        let details = OrgDetails {
            org_key: org_key.to_string(),
            legal_name: non_blank(response.legal_name),
            trade_name: non_blank(response.trade_name),
            address: Address {
                street: non_blank(response.street),
                number: non_blank(response.number),
                complement: non_blank(response.complement),
                district: non_blank(response.district),
                city: non_blank(response.city),
                state: non_blank(response.state),
                postal_code: non_blank(response.postal_code),
            },
            phone: non_blank(response.phone),
            email: non_blank(response.email).map(|e| e.to_lowercase()),
            registration_status: non_blank(response.registration_status),
        };

        Some(details)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
