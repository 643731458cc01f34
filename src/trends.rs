//! Aggregations behind the dashboard charts, and the issue search filter.
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    ingest::{LogTable, SchemaWarning},
    model::{Issue, LogLevel, LogRecord},
};

pub const ALL_PRIORITIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub error_count: usize,
}

/// ERROR rows per calendar day, oldest first. Days between the first and
/// last error day with no errors appear with a zero count.
#[must_use]
pub fn daily_error_counts(records: &[LogRecord]) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| r.level == LogLevel::Error) {
        if let Some(ts) = record.timestamp {
            *per_day.entry(ts.date()).or_default() += 1;
        }
    }

    let (Some(first), Some(last)) = (
        per_day.keys().next().copied(),
        per_day.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| DailyCount {
            day,
            error_count: per_day.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

/// ERROR rows per service, most errors first, ties by name.
#[must_use]
pub fn errors_by_service(records: &[LogRecord]) -> Vec<ServiceCount> {
    let mut per_service: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| r.level == LogLevel::Error) {
        *per_service.entry(record.service.as_str()).or_default() += 1;
    }

    let mut counts: Vec<ServiceCount> = per_service
        .into_iter()
        .map(|(service, error_count)| ServiceCount {
            service: service.to_string(),
            error_count,
        })
        .collect();
    counts.sort_by(|a, b| {
        b.error_count
            .cmp(&a.error_count)
            .then_with(|| a.service.cmp(&b.service))
    });
    counts
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendReport {
    pub daily_errors: Vec<DailyCount>,
    pub errors_by_service: Vec<ServiceCount>,
    /// Why a chart is empty or missing, for display next to it.
    pub notices: Vec<String>,
}

impl TrendReport {
    #[must_use]
    pub fn build(table: &LogTable) -> Self {
        let mut report = Self::default();

        if table.has_column(SchemaWarning::MissingTimestamp) {
            report.daily_errors = daily_error_counts(&table.records);
            if report.daily_errors.is_empty() {
                report.notices.push("No ERROR logs found to plot trend.".to_string());
            }
        } else {
            report.notices.push(
                "Cannot draw trend: Log file is missing 'Timestamp' column.".to_string(),
            );
        }

        if table.has_column(SchemaWarning::MissingService) {
            report.errors_by_service = errors_by_service(&table.records);
            if report.errors_by_service.is_empty() {
                report.notices.push("No ERROR logs found to plot services.".to_string());
            }
        } else {
            report.notices.push(
                "Cannot draw chart: Log file is missing 'ServiceID' column.".to_string(),
            );
        }

        report
    }
}

/// Search over extracted issues: exact priority label and a
/// case-insensitive substring of the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueFilter {
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, rename = "q")]
    pub search: Option<String>,
}

impl IssueFilter {
    #[must_use]
    pub fn apply<'a>(&self, issues: &'a [Issue]) -> Vec<&'a Issue> {
        let priority = self
            .priority
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != ALL_PRIORITIES);
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        issues
            .iter()
            .filter(|issue| priority.is_none_or(|p| issue.priority.as_str() == p))
            .filter(|issue| {
                needle
                    .as_deref()
                    .is_none_or(|n| issue.summary.to_lowercase().contains(n))
            })
            .collect()
    }
}

/// `All` followed by each distinct priority label in order of appearance.
#[must_use]
pub fn priority_options(issues: &[Issue]) -> Vec<String> {
    let mut options = vec![ALL_PRIORITIES.to_string()];
    for issue in issues {
        let label = issue.priority.as_str();
        if !options.iter().skip(1).any(|existing| existing == label) {
            options.push(label.to_string());
        }
    }
    options
}
