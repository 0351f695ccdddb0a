use crate::config::LoggingConfig;
use crate::domains::logger::{DomainLogger, DynLogger};
use super::{init_console_logger, init_file_logger, init_noop_logger};
use std::sync::Arc;

/// Forwards every message to each attached logger.
pub struct MultiLogger {
    targets: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(targets: Vec<DynLogger>) -> Self {
        Self { targets }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.error(msg));
    }
}

/// Build the operator logger from the `logging` section: the file logger if
/// configured and available, plus the console if enabled.
pub fn init_combined_logger(config: &LoggingConfig, fleet_id: &str) -> DynLogger {
    let mut targets = Vec::new();
    if let Some(path) = &config.file {
        match init_file_logger(path, false) {
            Ok(file_logger) => targets.push(file_logger),
            Err(e) => eprintln!("{}; continuing without log file", e),
        }
    }
    if config.console {
        targets.push(init_console_logger(fleet_id));
    }
    match targets.len() {
        0 => init_noop_logger(),
        1 => targets.remove(0),
        _ => Arc::new(MultiLogger::new(targets)),
    }
}
