use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Import setup error: {0}")]
    SetupError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl AppError {
    /// Whether a chunk-level failure is worth retrying.
    ///
    /// Timeouts and rate limits always are. Database and external-service
    /// failures are retried only when their message points at the network,
    /// a timeout, or a 5xx status; constraint violations and bad rows are not.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Timeout(_) | AppError::RateLimitError(_) => true,
            AppError::DatabaseError(msg)
            | AppError::ExternalServiceError(msg)
            | AppError::ApiError(msg)
            | AppError::InternalError(msg) => transient_message(msg),
            AppError::NotFound(_)
            | AppError::InvalidInput(_)
            | AppError::SerializationError(_)
            | AppError::ValidationError(_)
            | AppError::SetupError(_)
            | AppError::InvalidOperation(_) => false,
        }
    }
}

const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "connection refused",
    "connection reset",
    "connection closed",
    "could not connect",
    "broken pipe",
    "temporarily unavailable",
    "service unavailable",
    "bad gateway",
    "too many connections",
];

fn transient_message(msg: &str) -> bool {
    let lowered = msg.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return true;
    }
    server_status_pattern()
        .map(|pattern| pattern.is_match(&lowered))
        .unwrap_or(false)
}

fn server_status_pattern() -> Option<&'static regex::Regex> {
    static PATTERN: std::sync::OnceLock<Option<regex::Regex>> = std::sync::OnceLock::new();
    PATTERN
        .get_or_init(|| {
            // "HTTP 503", "status: 502", "returned 500", "5xx"; bare numbers are not statuses
            regex::Regex::new(r"\b(?:http|status|returned)\s*:?\s*5\d\d\b|\b5xx\b").ok()
        })
        .as_ref()
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                AppError::NotFound("Record not found in database".to_string())
            }
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        AppError::DatabaseError(format!("Database pool error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::ExternalServiceError("Failed to connect to external service".to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 => AppError::RateLimitError("Too many requests".to_string()),
                404 => AppError::NotFound("External resource not found".to_string()),
                _ => AppError::ApiError(format!("HTTP {}: {}", status, err)),
            }
        } else {
            AppError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::SerializationError(format!("CSV error: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Background task failed: {}", err))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::InvalidInput(format!("Invalid number: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
