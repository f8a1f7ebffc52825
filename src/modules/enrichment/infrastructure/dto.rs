use serde::Deserialize;

/// Single-object payload returned by the registry for one organization.
///
/// Failed lookups come back with HTTP 200 and `status = "ERROR"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryOrganizationResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "cnpj")]
    pub registration_number: Option<String>,
    #[serde(rename = "nome")]
    pub legal_name: Option<String>,
    #[serde(rename = "fantasia")]
    pub trade_name: Option<String>,
    #[serde(rename = "logradouro")]
    pub street: Option<String>,
    #[serde(rename = "numero")]
    pub number: Option<String>,
    #[serde(rename = "complemento")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    pub district: Option<String>,
    #[serde(rename = "municipio")]
    pub city: Option<String>,
    #[serde(rename = "uf")]
    pub state: Option<String>,
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "situacao")]
    pub registration_status: Option<String>,
}

impl RegistryOrganizationResponse {
    pub fn is_error(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("ERROR"))
            .unwrap_or(false)
    }
}
