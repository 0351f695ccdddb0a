use chrono::Utc;
use log::{error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

/// Operator-facing logging port used by the kernel executor.
/// Phases log through `tracing`; this port carries the messages an operator
/// of the fleet should see (rejected commands, failed orders, journal errors).
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// File adapter backed by `fast_log`.
pub struct FileLogger;

impl FileLogger {
    /// Initialize `fast_log` with a file appender at `path`, optionally
    /// mirroring to the console.
    pub fn init(path: &str, console: bool) -> Result<(), Box<dyn std::error::Error>> {
        let mut config = fast_log::config::Config::new()
            .file(path)
            .level(log::LevelFilter::Info);
        if console {
            config = config.console();
        }
        fast_log::init(config)?;
        Ok(())
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log_info!("{} [fleet] {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log_warn!("{} [fleet] {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log_error!("{} [fleet] {}", Utc::now().to_rfc3339(), msg);
    }
}
