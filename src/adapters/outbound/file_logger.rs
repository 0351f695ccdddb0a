use crate::domains::logger::{DynLogger, FileLogger};
use std::sync::Arc;

/// Set up `fast_log` writing to `path` and return the logger to inject.
/// `fast_log` is process-global; a second call fails.
pub fn init_file_logger(path: &str, mirror_to_console: bool) -> Result<DynLogger, String> {
    FileLogger::init(path, mirror_to_console)
        .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(FileLogger))
}
