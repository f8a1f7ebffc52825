//! Registry data of an organization, as used when creating an employer
use crate::modules::records::Address;
use serde::{Deserialize, Serialize};

/// Placeholder used when neither the registry nor the document names the organization
pub const UNKNOWN_ORGANIZATION: &str = "Unknown Organization";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgDetails {
    pub org_key: String,
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Registration situation as reported by the registry ("ATIVA", "BAIXADA", ...)
    pub registration_status: Option<String>,
}

/// Display name for a new employer.
///
/// Precedence: registry legal name, registry trade name, the name printed on
/// the source document, then `UNKNOWN_ORGANIZATION`. Blank values are skipped.
pub fn resolve_display_name(details: Option<&OrgDetails>, document_name: &str) -> String {
    let registry_names = details
        .into_iter()
        .flat_map(|d| [d.legal_name.as_deref(), d.trade_name.as_deref()]);

    registry_names
        .chain(std::iter::once(Some(document_name)))
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(legal: Option<&str>, trade: Option<&str>) -> OrgDetails {
        OrgDetails {
            org_key: "11111111000111".into(),
            legal_name: legal.map(String::from),
            trade_name: trade.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_legal_name_wins() {
        let d = details(Some("ACME COMERCIO LTDA"), Some("Acme"));
        assert_eq!(resolve_display_name(Some(&d), "Acme Store"), "ACME COMERCIO LTDA");
    }

    #[test]
    fn test_trade_name_when_legal_name_missing() {
        let d = details(None, Some("Acme"));
        assert_eq!(resolve_display_name(Some(&d), "Acme Store"), "Acme");

        let blank_legal = details(Some("   "), Some("Acme"));
        assert_eq!(resolve_display_name(Some(&blank_legal), "Acme Store"), "Acme");
    }

    #[test]
    fn test_document_name_without_registry_data() {
        assert_eq!(resolve_display_name(None, "Acme Store"), "Acme Store");
        let empty = details(None, None);
        assert_eq!(resolve_display_name(Some(&empty), "Acme Store"), "Acme Store");
    }

    #[test]
    fn test_placeholder_as_last_resort() {
        assert_eq!(resolve_display_name(None, ""), UNKNOWN_ORGANIZATION);
        assert_eq!(resolve_display_name(None, "  "), UNKNOWN_ORGANIZATION);
    }
}
