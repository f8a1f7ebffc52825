pub mod org_details;
pub mod registry;

pub use org_details::{resolve_display_name, OrgDetails, UNKNOWN_ORGANIZATION};
pub use registry::OrganizationRegistry;
