use std::{fs, io::BufWriter, path::PathBuf};

use anyhow::Context;
use chrono::{Local, TimeDelta};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

use logeasy::{
    fixtures::{Scenario, generate_records, write_csv},
    observability,
};

/// Writes synthetic CSV log files for trying out the analyzer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the CSV files are written to
    #[arg(long, default_value = "sample_logs")]
    out_dir: PathBuf,

    /// Rows per file
    #[arg(long, default_value = "10000")]
    count: usize,

    /// Seed for reproducible output
    #[arg(long, env = "LOGEASY_FIXTURE_SEED")]
    seed: Option<u64>,

    /// Scenario to generate; repeat for several, defaults to all
    #[arg(long, value_enum)]
    scenario: Vec<Scenario>,
}

fn main() -> anyhow::Result<()> {
    observability::tracing::init_cli()?;
    let args = Args::parse();

    let scenarios = if args.scenario.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        args.scenario
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let start = Local::now().naive_local() - TimeDelta::days(1);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    for scenario in scenarios {
        let path = args.out_dir.join(scenario.file_name());
        let records = generate_records(scenario, args.count, start, &mut rng);
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_csv(BufWriter::new(file), &records)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = records.len(), ?scenario, "wrote log file");
    }

    Ok(())
}
