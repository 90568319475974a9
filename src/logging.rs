use flexi_logger::{FileSpec, FlexiLoggerError, Logger, LoggerHandle};
use std::path::Path;

pub const DEFAULT_LOG_LEVEL: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "info"
};

/// Starts logging for a host process. `RUST_LOG` overrides `level`; with a
/// `log_file` the output goes there instead of stderr.
///
/// Keep the returned handle alive for as long as logging is needed.
pub fn init(
    level: Option<&str>,
    log_file: Option<&Path>,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let mut logger = Logger::try_with_env_or_str(level.unwrap_or(DEFAULT_LOG_LEVEL))?;

    if let Some(log_file) = log_file {
        logger = logger
            .log_to_file(FileSpec::try_from(log_file.to_path_buf())?)
            .print_message();
    }

    logger.start()
}
