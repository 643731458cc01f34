//! Synthetic log generator used for demos and tests.
use std::io::Write;

use chrono::{NaiveDateTime, TimeDelta};
use clap::ValueEnum;
use rand::Rng;

use crate::model::{LogLevel, LogRecord};

pub const SERVICES: [&str; 5] = ["PaymentAPI", "AuthService", "BankConnector", "UserDB", "WebApp"];

const INFO_MESSAGES: [&str; 4] = [
    "Transaction successful ID: {id}",
    "User {id} logged in",
    "Data fetched for UserID: {id}",
    "Service status OK",
];
const WARN_MESSAGES: [&str; 3] = [
    "Response time exceeded 2000ms",
    "Database connection pool at 80% capacity",
    "Invalid input for UserID: {id}",
];
const ERROR_MESSAGES: [&str; 4] = [
    "Payment failed: Bank server timeout",
    "Critical: Database connection failed",
    "AuthService token validation failed",
    "Service {service} is down",
];
const SECURITY_MESSAGES: [&str; 3] = [
    "Suspicious login attempt from IP: {ip}",
    "Multiple failed payment attempts for UserID: {id}",
    "Potential SQL injection attempt detected",
];

/// Shape of a generated day of logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// About 95% INFO, 3% WARN, 2% ERROR.
    Normal,
    /// A 20% ERROR burst between 03:00 and 03:10.
    Critical,
    /// About 10% SECURITY rows.
    Security,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Normal, Scenario::Critical, Scenario::Security];

    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Normal => "normal_day.csv",
            Self::Critical => "critical_event.csv",
            Self::Security => "security_threat.csv",
        }
    }
}

/// Generates `total` rows spread over the 24 hours after `start`.
pub fn generate_records<R: Rng + ?Sized>(
    scenario: Scenario,
    total: usize,
    start: NaiveDateTime,
    rng: &mut R,
) -> Vec<LogRecord> {
    let burst_start = start.date().and_hms_opt(3, 0, 0).unwrap_or(start);

    (0..total)
        .map(|_| {
            let mut timestamp = start + TimeDelta::seconds(rng.random_range(1_800..=86_000));
            let level = match scenario {
                Scenario::Normal => {
                    if rng.random_bool(0.95) {
                        LogLevel::Info
                    } else if rng.random_bool(0.6) {
                        LogLevel::Warn
                    } else {
                        LogLevel::Error
                    }
                }
                Scenario::Critical => {
                    if rng.random_bool(0.20) {
                        timestamp = burst_start + TimeDelta::seconds(rng.random_range(1..=600));
                        LogLevel::Error
                    } else if rng.random_bool(0.98) {
                        LogLevel::Info
                    } else {
                        LogLevel::Warn
                    }
                }
                Scenario::Security => {
                    if rng.random_bool(0.10) {
                        LogLevel::Security
                    } else {
                        LogLevel::Info
                    }
                }
            };
            create_record(level, timestamp, rng)
        })
        .collect()
}

fn create_record<R: Rng + ?Sized>(
    level: LogLevel,
    timestamp: NaiveDateTime,
    rng: &mut R,
) -> LogRecord {
    let service = SERVICES[rng.random_range(0..SERVICES.len())];
    let templates: &[&str] = match level {
        LogLevel::Warn => &WARN_MESSAGES,
        LogLevel::Error => &ERROR_MESSAGES,
        LogLevel::Security => &SECURITY_MESSAGES,
        LogLevel::Info | LogLevel::Other(_) => &INFO_MESSAGES,
    };
    let template = templates[rng.random_range(0..templates.len())];
    let message = template
        .replace("{id}", &rng.random_range(1000..=9999).to_string())
        .replace("{service}", service)
        .replace(
            "{ip}",
            &format!(
                "192.168.{}.{}",
                rng.random_range(1..=254),
                rng.random_range(1..=254)
            ),
        );

    LogRecord::new(Some(timestamp), level, service, message)
}

/// Writes rows with the `Timestamp,LogLevel,ServiceID,Message` header.
///
/// # Errors
/// Propagates write failures from the underlying writer.
pub fn write_csv<W: Write>(writer: W, records: &[LogRecord]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Timestamp", "LogLevel", "ServiceID", "Message"])?;
    for record in records {
        let timestamp = record
            .timestamp
            .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            .unwrap_or_default();
        csv_writer.write_record([
            timestamp.as_str(),
            record.level.as_str(),
            record.service.as_str(),
            record.message.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
