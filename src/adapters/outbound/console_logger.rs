use crate::domains::logger::{DomainLogger, DynLogger};
use chrono::Utc;
use std::sync::Arc;

/// Operator messages on stdout / stderr, tagged with the fleet id.
pub struct ConsoleLogger {
    fleet_id: String,
}

impl ConsoleLogger {
    pub fn new(fleet_id: impl Into<String>) -> Self {
        Self { fleet_id: fleet_id.into() }
    }
}

impl DomainLogger for ConsoleLogger {
    fn info(&self, msg: &str) {
        println!("{} [{}] {}", Utc::now().format("%H:%M:%S%.3f"), self.fleet_id, msg);
    }

    fn warn(&self, msg: &str) {
        println!("{} [{}] WARN: {}", Utc::now().format("%H:%M:%S%.3f"), self.fleet_id, msg);
    }

    fn error(&self, msg: &str) {
        eprintln!("{} [{}] ERROR: {}", Utc::now().format("%H:%M:%S%.3f"), self.fleet_id, msg);
    }
}

/// Console-backed logger, also the fallback when the log file cannot be opened.
pub fn init_console_logger(fleet_id: &str) -> DynLogger {
    Arc::new(ConsoleLogger::new(fleet_id))
}
