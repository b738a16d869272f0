//! Quarry logging backend for the standard `log` crate
//!
//! Library code logs with the usual macros (`log::debug!`, `log::warn!`, ...).
//! Applications that want Quarry's formatting install the backend once:
//!
//! ```rust,no_run
//! use quarry_core::logging::{init_logging, LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::production()
//!     .with_format(LogFormat::Logfmt)
//!     .with_context_field("service", "catalog-sync");
//! init_logging(&config).unwrap();
//!
//! log::info!("Synchronizing {} types", 12);
//! ```

pub mod config;
pub mod formatter;

pub use config::{LogLevel, LogOutput, LoggingConfig};
pub use formatter::{LogEntry, LogFormat};

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the Quarry logger
///
/// Only the first call has an effect; later calls are ignored. When another
/// logger is already installed the call leaves it in place.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = init_logging_internal(config);
    });
    result
}

fn init_logging_internal(config: &LoggingConfig) -> anyhow::Result<()> {
    let logger = QuarryLogger::new(config.clone());
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(log::Level::from(config.level).to_level_filter());
    Ok(())
}

struct QuarryLogger {
    config: LoggingConfig,
    writer: Box<dyn LogWriter>,
}

impl QuarryLogger {
    fn new(config: LoggingConfig) -> Self {
        let writer: Box<dyn LogWriter> = match config.output {
            LogOutput::Stdout => Box::new(StdoutWriter),
            LogOutput::Stderr => Box::new(StderrWriter),
        };
        Self { config, writer }
    }
}

impl log::Log for QuarryLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::from(self.config.level)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_log_record(record, &self.config.context_fields);
        let _ = self.writer.write_line(&self.config.format.format_entry(&entry));
    }

    fn flush(&self) {
        let _ = self.writer.flush();
    }
}

trait LogWriter: Send + Sync {
    fn write_line(&self, line: &str) -> std::io::Result<()>;
    fn flush(&self) -> std::io::Result<()>;
}

struct StdoutWriter;

impl LogWriter for StdoutWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        writeln!(std::io::stdout().lock(), "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}

struct StderrWriter;

impl LogWriter for StderrWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        writeln!(std::io::stderr().lock(), "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_logger_filters_by_level() {
        let logger = QuarryLogger::new(LoggingConfig::default().with_level(LogLevel::Warn));
        let warn = log::Metadata::builder().level(log::Level::Warn).target("t").build();
        let debug = log::Metadata::builder().level(log::Level::Debug).target("t").build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::development();
        let first = init_logging(&config);
        assert!(init_logging(&config).is_ok());
        // Another test binary may already own the global logger
        let _ = first;
        log::debug!("logger installed");
    }
}
