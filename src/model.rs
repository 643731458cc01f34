//! Domain types shared by ingest, sampling, parsing and the API.
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Severity label of a single log row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Security,
    /// Any label outside the known set, kept as written.
    Other(String),
}

impl LogLevel {
    /// Parses a `LogLevel` cell. Matching is case-insensitive and `WARNING` is
    /// accepted as [`LogLevel::Warn`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "INFO" => Self::Info,
            "WARN" | "WARNING" => Self::Warn,
            "ERROR" => Self::Error,
            "SECURITY" => Self::Security,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Security => "SECURITY",
            Self::Other(label) => label,
        }
    }

    /// Levels worth sending to the model.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Error | Self::Warn | Self::Security)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of the uploaded CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub level: LogLevel,
    pub service: String,
    pub message: String,
}

impl LogRecord {
    #[must_use]
    pub fn new(
        timestamp: Option<NaiveDateTime>,
        level: LogLevel,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            service: service.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    Error,
    Warning,
}

/// Priority assigned by the model. The cell is kept as written: only the
/// exact labels High, Medium and Low map to named variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
    Other(String),
}

impl Priority {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single error or warning extracted from a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub priority: Priority,
    pub summary: String,
    pub suggestion: String,
}

/// Output of one analysis run over one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub warnings: Vec<Issue>,
    pub errors: Vec<Issue>,
    pub insight: String,
    /// Reply lines that looked like table rows but could not be used.
    pub dropped_lines: usize,
}

impl AnalysisResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parsing_is_case_insensitive() {
        assert_eq!(LogLevel::parse("error"), LogLevel::Error);
        assert_eq!(LogLevel::parse(" Warning "), LogLevel::Warn);
        assert_eq!(LogLevel::parse("SECURITY"), LogLevel::Security);
        assert_eq!(LogLevel::parse("DEBUG"), LogLevel::Other("DEBUG".into()));
    }

    #[test]
    fn only_error_warn_security_are_actionable() {
        assert!(LogLevel::Error.is_actionable());
        assert!(LogLevel::Warn.is_actionable());
        assert!(LogLevel::Security.is_actionable());
        assert!(!LogLevel::Info.is_actionable());
        assert!(!LogLevel::Other("TRACE".into()).is_actionable());
    }

    #[test]
    fn priority_keeps_its_label_as_written() {
        assert_eq!(Priority::parse(" High "), Priority::High);
        assert_eq!(Priority::parse("HIGH"), Priority::Other("HIGH".into()));
        assert_eq!(Priority::parse("low").as_str(), "low");
        let critical = Priority::parse("Critical");
        assert_eq!(critical.as_str(), "Critical");
        assert_eq!(
            serde_json::to_value(&critical).expect("serializes"),
            serde_json::json!("Critical")
        );
    }
}
