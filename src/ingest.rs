//! CSV ingestion for uploaded log files.
use std::{fs::File, io::Read, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{LogLevel, LogRecord};

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const LEVEL_COLUMN: &str = "LogLevel";
pub const SERVICE_COLUMN: &str = "ServiceID";
pub const MESSAGE_COLUMN: &str = "Message";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("log file is missing required column {0}")]
    MissingColumn(&'static str),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Column that the dashboard needs but the analysis can live without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaWarning {
    MissingTimestamp,
    MissingService,
    MissingMessage,
}

impl SchemaWarning {
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::MissingTimestamp => TIMESTAMP_COLUMN,
            Self::MissingService => SERVICE_COLUMN,
            Self::MissingMessage => MESSAGE_COLUMN,
        }
    }
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "log file is missing the '{}' column", self.column())
    }
}

/// Parsed upload: the rows plus what was missing from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTable {
    pub records: Vec<LogRecord>,
    pub warnings: Vec<SchemaWarning>,
    pub unparsed_timestamps: usize,
}

impl LogTable {
    #[must_use]
    pub fn has_column(&self, warning: SchemaWarning) -> bool {
        !self.warnings.contains(&warning)
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    timestamp: Option<usize>,
    level: usize,
    service: Option<usize>,
    message: Option<usize>,
}

impl ColumnMap {
    fn locate(headers: &StringRecord) -> Result<Self, IngestError> {
        let position = |name: &str| headers.iter().position(|header| header == name);
        let level = position(LEVEL_COLUMN).ok_or(IngestError::MissingColumn(LEVEL_COLUMN))?;
        Ok(Self {
            timestamp: position(TIMESTAMP_COLUMN),
            level,
            service: position(SERVICE_COLUMN),
            message: position(MESSAGE_COLUMN),
        })
    }

    fn warnings(self) -> Vec<SchemaWarning> {
        let mut warnings = Vec::new();
        if self.timestamp.is_none() {
            warnings.push(SchemaWarning::MissingTimestamp);
        }
        if self.service.is_none() {
            warnings.push(SchemaWarning::MissingService);
        }
        if self.message.is_none() {
            warnings.push(SchemaWarning::MissingMessage);
        }
        warnings
    }
}

/// Reads a header-first CSV log into a [`LogTable`].
///
/// Only `LogLevel` is required. Rows the CSV reader cannot decode (for
/// example a row with a different number of fields) fail the whole read.
///
/// # Errors
/// [`IngestError::MissingColumn`] without a `LogLevel` header,
/// [`IngestError::Csv`] for undecodable input.
pub fn read_log_csv<R: Read>(reader: R) -> Result<LogTable, IngestError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnMap::locate(&headers)?;
    let warnings = columns.warnings();

    let mut records = Vec::new();
    let mut unparsed_timestamps = 0usize;
    for row in csv_reader.records() {
        let row = row?;
        let cell = |index: Option<usize>| index.and_then(|i| row.get(i)).unwrap_or_default();

        let timestamp = match columns.timestamp {
            Some(index) => {
                let parsed = parse_timestamp(row.get(index).unwrap_or_default());
                if parsed.is_none() {
                    unparsed_timestamps += 1;
                }
                parsed
            }
            None => None,
        };

        records.push(LogRecord::new(
            timestamp,
            LogLevel::parse(cell(Some(columns.level))),
            cell(columns.service),
            cell(columns.message),
        ));
    }

    debug!(
        rows = records.len(),
        unparsed_timestamps,
        missing_columns = warnings.len(),
        "log csv ingested"
    );

    Ok(LogTable {
        records,
        warnings,
        unparsed_timestamps,
    })
}

/// Opens and reads a CSV log file from disk.
///
/// # Errors
/// See [`read_log_csv`]; also [`IngestError::Io`] when the file cannot be opened.
pub fn read_log_file(path: impl AsRef<Path>) -> Result<LogTable, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_log_csv(file)
}

/// Parses the ISO-8601 shapes seen in log exports. Offsets are folded into UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
