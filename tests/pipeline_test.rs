use std::{fs::File, io::BufWriter, num::NonZeroUsize};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rand::{SeedableRng, rngs::StdRng};

use logeasy::{
    fixtures::{Scenario, generate_records, write_csv},
    ingest::read_log_file,
    model::LogLevel,
    preprocess::{DEFAULT_SAMPLE_CAP, LogSampler},
    prompts::render_extraction_prompt,
    trends::TrendReport,
};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .and_then(|day| day.and_hms_opt(0, 15, 0))
        .expect("valid start")
}

fn write_fixture(dir: &tempfile::TempDir, scenario: Scenario, seed: u64) -> std::path::PathBuf {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = generate_records(scenario, 2_000, start(), &mut rng);
    let path = dir.path().join(scenario.file_name());
    let file = File::create(&path).expect("fixture file");
    write_csv(BufWriter::new(file), &records).expect("fixture written");
    path
}

#[test]
fn critical_fixture_samples_only_actionable_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, Scenario::Critical, 7);

    let table = read_log_file(&path).expect("fixture reads");
    assert_eq!(table.records.len(), 2_000);
    assert!(table.warnings.is_empty());

    let mut rng = StdRng::seed_from_u64(11);
    let sample = LogSampler::default().prepare_with_rng(&table.records, &mut rng);

    assert!(sample.filtered_total > DEFAULT_SAMPLE_CAP);
    assert_eq!(sample.records.len(), DEFAULT_SAMPLE_CAP);
    assert!(sample.records.iter().all(|r| r.level.is_actionable()));

    let prompt = render_extraction_prompt(&sample.serialized);
    assert!(prompt.contains("--- LOG DATA BEGINS ---"));
    assert!(prompt.contains("LogLevel"));
    assert!(!prompt.contains("{logs}"));
}

#[test]
fn critical_fixture_trend_shows_the_burst() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, Scenario::Critical, 8);
    let table = read_log_file(&path).expect("fixture reads");

    let report = TrendReport::build(&table);

    assert_eq!(report.daily_errors.len(), 1);
    assert_eq!(report.daily_errors[0].day, start().date());
    let total: usize = report.errors_by_service.iter().map(|s| s.error_count).sum();
    assert_eq!(total, report.daily_errors[0].error_count);
    assert!(table
        .records
        .iter()
        .filter(|r| r.level == LogLevel::Error)
        .all(|r| r.timestamp.is_some_and(|ts| ts.hour() == 3 && ts.minute() <= 10)));
}

#[test]
fn small_cap_keeps_original_row_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, Scenario::Security, 9);
    let table = read_log_file(&path).expect("fixture reads");

    let sampler = LogSampler::new(NonZeroUsize::new(5).expect("non-zero"));
    let mut rng = StdRng::seed_from_u64(3);
    let sample = sampler.prepare_with_rng(&table.records, &mut rng);

    assert_eq!(sample.records.len(), 5);
    assert!(sample.records.iter().all(|r| r.level == LogLevel::Security));
    let positions: Vec<usize> = sample
        .records
        .iter()
        .map(|s| {
            table
                .records
                .iter()
                .position(|r| r == s)
                .expect("sampled row comes from the table")
        })
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn normal_fixture_is_mostly_filtered_out() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, Scenario::Normal, 10);
    let table = read_log_file(&path).expect("fixture reads");

    let sample = LogSampler::default().prepare(&table.records);

    assert!(sample.filtered_total < table.records.len() / 5);
    assert!(sample.records.len() <= DEFAULT_SAMPLE_CAP);
}
