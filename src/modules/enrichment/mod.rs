pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::EnrichmentService;
pub use domain::{resolve_display_name, OrgDetails, OrganizationRegistry, UNKNOWN_ORGANIZATION};
pub use infrastructure::RegistryClient;
