//! Selects the log rows worth sending to the model and renders them as text.
use std::num::NonZeroUsize;

use rand::Rng;
use tracing::debug;

use crate::model::LogRecord;

/// Largest number of rows sent in one prompt.
pub const DEFAULT_SAMPLE_CAP: usize = 100;

const COLUMNS: [&str; 4] = ["Timestamp", "LogLevel", "ServiceID", "Message"];
const MISSING_TIMESTAMP: &str = "NaT";

/// Bounded subset of actionable rows plus its prompt rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    pub records: Vec<LogRecord>,
    pub serialized: String,
    /// Actionable rows found before the cap was applied.
    pub filtered_total: usize,
}

impl Sample {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LogSampler {
    cap: NonZeroUsize,
}

impl Default for LogSampler {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_SAMPLE_CAP).unwrap_or(NonZeroUsize::MIN))
    }
}

impl LogSampler {
    #[must_use]
    pub fn new(cap: NonZeroUsize) -> Self {
        Self { cap }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap.get()
    }

    #[must_use]
    pub fn prepare(&self, records: &[LogRecord]) -> Sample {
        self.prepare_with_rng(records, &mut rand::rng())
    }

    /// Keeps ERROR, WARN and SECURITY rows. When more than `cap` remain, draws
    /// `cap` of them uniformly without replacement; the survivors keep their
    /// original relative order.
    pub fn prepare_with_rng<R: Rng + ?Sized>(&self, records: &[LogRecord], rng: &mut R) -> Sample {
        let filtered: Vec<&LogRecord> = records
            .iter()
            .filter(|record| record.level.is_actionable())
            .collect();
        let filtered_total = filtered.len();

        if filtered.is_empty() {
            debug!(input = records.len(), "no actionable log rows");
            return Sample::default();
        }

        let selected: Vec<LogRecord> = if filtered_total > self.cap() {
            let mut indices =
                rand::seq::index::sample(rng, filtered_total, self.cap()).into_vec();
            indices.sort_unstable();
            indices.into_iter().map(|i| filtered[i].clone()).collect()
        } else {
            filtered.into_iter().cloned().collect()
        };

        debug!(
            input = records.len(),
            filtered = filtered_total,
            sampled = selected.len(),
            "log sample prepared"
        );

        let serialized = render_table(&selected);
        Sample {
            records: selected,
            serialized,
            filtered_total,
        }
    }
}

/// Samples with the default cap and thread-local randomness.
#[must_use]
pub fn prepare_sample(records: &[LogRecord]) -> Sample {
    LogSampler::default().prepare(records)
}

/// Renders rows as a fixed-width table, one row per line, columns
/// right-aligned to their widest cell.
#[must_use]
pub fn render_table(records: &[LogRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|record| {
            [
                record.timestamp.map_or_else(
                    || MISSING_TIMESTAMP.to_string(),
                    |ts| ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                ),
                record.level.to_string(),
                record.service.clone(),
                record.message.clone(),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|name| name.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, COLUMNS.iter().copied(), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 4]) {
    if !out.is_empty() {
        out.push('\n');
    }
    let line = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join(" ");
    out.push_str(&line);
}
