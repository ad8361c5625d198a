use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use log::{info, warn};

use promo_prep::analysis::{
    self, Dimension, Measure, crosstab, describe_by, group_rates, performance_ttest,
    promotion_chi_square, promotion_rate,
};
use promo_prep::export::{write_features, write_json, write_prepared};
use promo_prep::features::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION, prepare_model_input};
use promo_prep::{
    ParquetWorkbook, PipelineConfig, PreparedRecord, WorkbookSource, XlsxWorkbook, run_pipeline,
};

/// Prepare employee roster and mid-year outcome data for promotion analysis
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Spreadsheet workbook, or a directory of `<sheet>.parquet` files
    input: PathBuf,

    /// Where to write the prepared table
    #[arg(short, long, default_value = "prepared.parquet")]
    output: PathBuf,

    /// Drop malformed rows instead of failing the run
    #[arg(long)]
    lenient: bool,

    /// Reference date for tenure (YYYY-MM-DD)
    #[arg(long)]
    cutoff: Option<NaiveDate>,

    /// Minimum tenure in years for eligibility
    #[arg(long)]
    min_tenure: Option<f64>,

    /// Name of the roster sheet
    #[arg(long)]
    roster_sheet: Option<String>,

    /// Name of the outcomes sheet
    #[arg(long)]
    outcomes_sheet: Option<String>,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write scaled train/test feature tables to this directory
    #[arg(long)]
    features: Option<PathBuf>,

    /// Seed for the train/test split
    #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
    seed: u64,

    /// Share of rows held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// Print promotion rates, cross-tabulations and significance tests
    #[arg(long)]
    summary: bool,

    /// Extra grouping for the promotion-rate summary, e.g. `job_role,is_men`
    #[arg(long, value_delimiter = ',')]
    group_by: Vec<Dimension>,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(sheet) = &self.roster_sheet {
            config.roster_sheet.clone_from(sheet);
        }
        if let Some(sheet) = &self.outcomes_sheet {
            config.outcomes_sheet.clone_from(sheet);
        }
        if let Some(cutoff) = self.cutoff {
            config.cutoff_date = cutoff;
        }
        if let Some(years) = self.min_tenure {
            config.min_tenure_years = years;
        }
        if self.lenient {
            config = config.lenient();
        }
        config
    }
}

fn open_source(path: &Path) -> anyhow::Result<Box<dyn WorkbookSource>> {
    if path.is_dir() {
        let workbook = ParquetWorkbook::open(path)
            .with_context(|| format!("Failed to open parquet workbook {}", path.display()))?;
        Ok(Box::new(workbook))
    } else {
        let workbook = XlsxWorkbook::open(path)
            .with_context(|| format!("Failed to open spreadsheet {}", path.display()))?;
        Ok(Box::new(workbook))
    }
}

fn print_summary(records: &[PreparedRecord], extra: &[Dimension]) -> anyhow::Result<()> {
    println!("Employees: {}", records.len());
    println!("Promotion rate: {:.1}%", promotion_rate(records)? * 100.0);

    let mut groupings: Vec<Vec<Dimension>> = vec![
        vec![Dimension::IsMen],
        vec![Dimension::JobLevel],
        vec![Dimension::JobRole],
        vec![Dimension::JobRank],
        vec![Dimension::PerfRank, Dimension::IsMen],
    ];
    if !extra.is_empty() {
        groupings.push(extra.to_vec());
    }
    for dimensions in &groupings {
        let names: Vec<&str> = dimensions.iter().map(|d| d.column()).collect();
        println!("\nPromotion rate by {}:", names.join(", "));
        for group in group_rates(records, dimensions) {
            println!(
                "  {:<24} {:>6} {:>6.1}%",
                group.key.join(" / "),
                group.count,
                group.rate * 100.0
            );
        }
    }

    for column in [Dimension::Region, Dimension::JobRole, Dimension::JobRank] {
        let table = crosstab(records, Dimension::IsMen, column);
        println!("\nis_men x {column}: {}", table.column_labels.join(" | "));
        for (label, counts) in table.row_labels.iter().zip(&table.counts) {
            let cells: Vec<String> = counts.iter().map(ToString::to_string).collect();
            println!("  {label}: {}", cells.join(" | "));
        }
    }

    println!("\nperf_rank by is_men:");
    for group in describe_by(records, Dimension::IsMen, Measure::PerfRank) {
        let s = &group.stats;
        println!(
            "  {}: count {} mean {:.3} std {} min {} 25% {} 50% {} 75% {} max {}",
            group.group,
            s.count,
            s.mean,
            s.std.map_or_else(|| "-".to_string(), |std| format!("{std:.3}")),
            s.min,
            s.q25,
            s.median,
            s.q75,
            s.max
        );
    }

    println!("\nSignificance (alpha = {}):", analysis::ALPHA);
    match performance_ttest(records) {
        Ok(t) => println!(
            "  perf_rank by gender: t = {:.3}, p = {:.3}{}",
            t.statistic,
            t.p_value,
            if t.significant { " (significant)" } else { "" }
        ),
        Err(err) => warn!("Skipping t-test: {err}"),
    }
    match promotion_chi_square(records) {
        Ok(chi) => println!(
            "  promotion by gender: chi2 = {:.3}, p = {:.3}{}",
            chi.statistic,
            chi.p_value,
            if chi.significant { " (significant)" } else { "" }
        ),
        Err(err) => warn!("Skipping chi-square test: {err}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    let start = Instant::now();

    let mut source = open_source(&cli.input)?;
    let output = run_pipeline(source.as_mut(), &config)
        .with_context(|| format!("Failed to prepare {}", cli.input.display()))?;
    let records = &output.records;

    write_prepared(&cli.output, records)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if let Some(dir) = &cli.features {
        let input = prepare_model_input(records, cli.test_fraction, cli.seed)
            .context("Failed to build feature table")?;
        write_features(&dir.join("train.parquet"), &input.train)?;
        write_features(&dir.join("test.parquet"), &input.test)?;
        info!(
            "Feature table: {} columns, {} train rows, {} test rows",
            input.train.columns.len(),
            input.train.len(),
            input.test.len()
        );
    }

    if let Some(path) = &cli.report {
        write_json(path, &output.report)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    if cli.summary {
        print_summary(records, &cli.group_by)?;
    }

    info!(
        "Prepared {} of {} joined rows in {:?}",
        output.report.final_rows,
        output.report.joined_rows,
        start.elapsed()
    );
    Ok(())
}
