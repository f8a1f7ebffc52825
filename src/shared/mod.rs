// Shared kernel: cross-module errors, configuration, infrastructure and logging

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod utils;

pub use config::{ImportConfig, RegistrySettings};
pub use errors::{AppError, AppResult};
pub use infrastructure::Database;
