//! Log entries and their output formats

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::logging::LogLevel;

/// How log lines are rendered
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON, one object per line
    /// Example: {"timestamp":"2024-01-15T10:30:00Z","level":"INFO","target":"quarry_core::schema::synthesizer","message":"Synthesized type Widget"}
    Json,

    /// Human-readable format (default)
    /// Example: 2024-01-15 10:30:00.000 INFO  [quarry_core::persistence] Created Widget 65f1... namespace=acme
    Human,

    /// key=value pairs
    /// Example: timestamp=2024-01-15T10:30:00Z level=WARN target=quarry_core::factory message="..."
    Logfmt,
}

impl LogFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "human" | "text" => Some(LogFormat::Human),
            "logfmt" => Some(LogFormat::Logfmt),
            _ => None,
        }
    }

    /// Format a log entry according to this format
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
            LogFormat::Logfmt => format_logfmt(entry),
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Usually the module path
    pub target: String,
    /// Static context fields and per-entry fields, sorted by key
    pub fields: BTreeMap<String, JsonValue>,
    pub location: Option<LogLocation>,
}

#[derive(Debug, Clone)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            level,
            message: message.into(),
            target: target.into(),
            fields: BTreeMap::new(),
            location: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Build an entry from a `log` record, adding the configured context fields
    pub fn from_log_record(record: &log::Record, context_fields: &BTreeMap<String, String>) -> Self {
        let mut entry = Self::new(record.level().into(), record.args().to_string(), record.target());
        for (key, value) in context_fields {
            entry.fields.insert(key.clone(), JsonValue::String(value.clone()));
        }
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            entry.location = Some(LogLocation { file: file.to_string(), line });
        }
        entry
    }

    fn level_name(&self) -> String {
        format!("{:?}", self.level).to_uppercase()
    }
}

fn plain(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();
    json.insert("timestamp".to_string(), JsonValue::String(entry.timestamp.to_rfc3339()));
    json.insert("level".to_string(), JsonValue::String(entry.level_name()));
    json.insert("target".to_string(), JsonValue::String(entry.target.clone()));
    json.insert("message".to_string(), JsonValue::String(entry.message.clone()));

    if let Some(location) = &entry.location {
        json.insert("file".to_string(), JsonValue::String(location.file.clone()));
        json.insert("line".to_string(), JsonValue::from(location.line));
    }

    for (key, value) in &entry.fields {
        json.insert(key.clone(), value.clone());
    }

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

fn format_human(entry: &LogEntry) -> String {
    let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
    let mut message =
        format!("{} {:5} [{}] {}", timestamp, entry.level_name(), entry.target, entry.message);

    for (key, value) in &entry.fields {
        message.push_str(&format!(" {}={}", key, plain(value)));
    }

    message
}

fn format_logfmt(entry: &LogEntry) -> String {
    let quote = |s: &str| format!("\"{}\"", s.replace('"', "\\\""));
    let mut parts = vec![
        format!("timestamp={}", entry.timestamp.to_rfc3339()),
        format!("level={}", entry.level_name()),
        format!("target={}", entry.target),
        format!("message={}", quote(&entry.message)),
    ];

    for (key, value) in &entry.fields {
        let value = match value {
            JsonValue::Number(_) | JsonValue::Bool(_) => value.to_string(),
            other => quote(&plain(other)),
        };
        parts.push(format!("{}={}", key, value));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_format() {
        let entry = LogEntry::new(LogLevel::Info, "Synthesized type Widget", "quarry_core::schema")
            .with_field("namespace", json!("acme"));

        let formatted = LogFormat::Json.format_entry(&entry);
        let parsed: JsonValue = serde_json::from_str(&formatted).unwrap();
        assert_eq!(parsed["message"], "Synthesized type Widget");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["target"], "quarry_core::schema");
        assert_eq!(parsed["namespace"], "acme");
    }

    #[test]
    fn test_human_format() {
        let entry = LogEntry::new(LogLevel::Error, "Batch item failed", "quarry_core::persistence")
            .with_field("index", json!(1));

        let formatted = LogFormat::Human.format_entry(&entry);
        assert!(formatted.contains("ERROR [quarry_core::persistence] Batch item failed"));
        assert!(formatted.ends_with("index=1"));
    }

    #[test]
    fn test_logfmt_quotes_strings() {
        let entry = LogEntry::new(LogLevel::Warn, "pattern \"(?=x)\" unsupported", "quarry_core::factory")
            .with_field("attribute", json!("code"))
            .with_field("attempts", json!(16));

        let formatted = LogFormat::Logfmt.format_entry(&entry);
        assert!(formatted.contains("level=WARN"));
        assert!(formatted.contains(r#"message="pattern \"(?=x)\" unsupported""#));
        assert!(formatted.contains(r#"attribute="code""#));
        assert!(formatted.contains("attempts=16"));
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Human));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
