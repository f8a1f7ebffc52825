use log::{debug, info, warn};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the logging system
/// This should be called once at application startup
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info) // Default level
            .filter_module("clinic_import", log::LevelFilter::Debug) // More verbose for our crate
            .filter_module("diesel", log::LevelFilter::Warn) // Reduce diesel noise
            .filter_module("reqwest", log::LevelFilter::Warn) // Reduce HTTP noise
            .filter_module("tokio", log::LevelFilter::Warn) // Reduce tokio noise
            .format_timestamp_secs()
            .format_target(false)
            .format_module_path(false)
            .try_init();

        // The registry client reports through `tracing`; give those events a
        // sink without touching the `log` logger installed above.
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);

        info!("Logging system initialized");
    });
}

/// Macro for structured logging with context
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// Structured logging helpers for common patterns
pub struct LogContext;

impl LogContext {
    /// Log database operations
    pub fn db_operation(operation: &str, table: &str, duration_ms: Option<u64>) {
        match duration_ms {
            Some(duration) => info!("DB: {} on {} completed in {}ms", operation, table, duration),
            None => debug!("DB: Starting {} on {}", operation, table),
        }
    }

    /// Log API calls
    pub fn api_call(service: &str, endpoint: &str, status: &str, duration_ms: Option<u64>) {
        match duration_ms {
            Some(duration) => info!("API: {} {} {} in {}ms", service, endpoint, status, duration),
            None => debug!("API: Starting {} {}", service, endpoint),
        }
    }

    /// Log chunk progress of an import run
    pub fn import_progress(run_id: &uuid::Uuid, chunk: usize, total_chunks: usize, rows: usize) {
        info!(
            "Import {}: [{}/{}] chunk finished ({} rows)",
            run_id,
            chunk + 1,
            total_chunks,
            rows
        );
    }

    /// Log a finished phase of the import pipeline
    pub fn phase_finished(phase: &str, duration_ms: u64, summary: &str) {
        info!("Phase: {} finished in {}ms ({})", phase, duration_ms, summary);
    }

    /// Log a pool checkout that made the caller wait
    pub fn slow_connection(duration_ms: u64) {
        warn!("DB: connection checkout took {}ms", duration_ms);
    }
}

/// Times one phase and reports it through [`LogContext::phase_finished`]
pub struct TimedOperation {
    start: std::time::Instant,
    phase: String,
}

impl TimedOperation {
    pub fn new(phase: &str) -> Self {
        debug!("Starting: {}", phase);
        Self {
            start: std::time::Instant::now(),
            phase: phase.to_string(),
        }
    }

    pub fn finish(self, summary: &str) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        LogContext::phase_finished(&self.phase, duration, summary);
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_operation_reports_elapsed_time() {
        init_logger();
        let timer = TimedOperation::new("snapshot load");
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert!(timer.finish("3 members, 1 employers") >= 5);
    }
}
