//! Runtime logger configuration

use std::collections::BTreeMap;

use crate::logging::LogFormat;

/// Logger setup consumed by [`init_logging`](crate::logging::init_logging)
#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Minimum level to emit
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Fields added to every entry
    pub context_fields: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Human,
            output: LogOutput::Stderr,
            context_fields: BTreeMap::new(),
        }
    }
}

/// Where log lines are written
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// Log levels in order of severity (compatible with standard log crate)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Trace => LogLevel::Trace,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

impl LoggingConfig {
    /// JSON lines on stdout at info level
    pub fn production() -> Self {
        Self { format: LogFormat::Json, output: LogOutput::Stdout, ..Self::default() }
    }

    /// Human-readable lines on stderr at debug level
    pub fn development() -> Self {
        Self { level: LogLevel::Debug, ..Self::default() }
    }

    /// Build from the `[logging]` section of the configuration file
    pub fn from_settings(settings: &crate::config::LoggingConfig) -> anyhow::Result<Self> {
        settings.validate()?;
        let level = LogLevel::parse(&settings.level)
            .ok_or_else(|| anyhow::anyhow!("Invalid log level: {}", settings.level))?;
        let format = LogFormat::parse(&settings.format)
            .ok_or_else(|| anyhow::anyhow!("Invalid log format: {}", settings.format))?;
        let output = if settings.target == "stdout" { LogOutput::Stdout } else { LogOutput::Stderr };
        Ok(Self { level, format, output, context_fields: BTreeMap::new() })
    }

    /// Add a context field that appears in every log entry
    pub fn with_context_field(mut self, key: &str, value: &str) -> Self {
        self.context_fields.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let production = LoggingConfig::production();
        assert_eq!(production.format, LogFormat::Json);
        assert_eq!(production.output, LogOutput::Stdout);

        let development = LoggingConfig::development();
        assert_eq!(development.level, LogLevel::Debug);
        assert_eq!(development.format, LogFormat::Human);
    }

    #[test]
    fn test_from_file_settings() {
        let settings = crate::config::LoggingConfig {
            level: "WARN".to_string(),
            format: "logfmt".to_string(),
            target: "stdout".to_string(),
        };
        let config = LoggingConfig::from_settings(&settings).unwrap().with_context_field("service", "sync");
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Logfmt);
        assert_eq!(config.output, LogOutput::Stdout);
        assert_eq!(config.context_fields.get("service").map(String::as_str), Some("sync"));

        let bad = crate::config::LoggingConfig { level: "loud".to_string(), ..settings };
        assert!(LoggingConfig::from_settings(&bad).is_err());
    }

    #[test]
    fn test_level_ordering_matches_log_crate() {
        assert!(LogLevel::Error < LogLevel::Debug);
        assert_eq!(log::Level::from(LogLevel::Warn), log::Level::Warn);
    }
}
