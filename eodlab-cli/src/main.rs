//! EodLab CLI: pull and validate commands.
//!
//! Commands:
//! - `pull`: fetch end-of-day bars from Marketstack and write them as Parquet
//! - `validate`: run the end-of-day expectation suite against a Parquet file

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use eodlab_core::config::Settings;
use eodlab_core::data::store::output_path;
use eodlab_core::data::{fetch, load_table, normalize, persist, EodRequest, MarketstackProvider};
use eodlab_core::quality::{build_suite, render, save_suite, validate, DEFAULT_SUITE_NAME};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "eodlab",
    about = "EodLab CLI: end-of-day market data ingestion and validation"
)]
struct Cli {
    /// Optional TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch end-of-day bars and persist them as Parquet.
    Pull {
        /// Tickers to pull (repeatable or comma-separated). Defaults to the configured list.
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        tickers: Option<Vec<String>>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2025-01-01")]
        start_date: NaiveDate,

        /// End date (YYYY-MM-DD).
        #[arg(long, default_value = "2025-01-10")]
        end_date: NaiveDate,

        /// Output file name, resolved against the output directory.
        #[arg(long, default_value = "eod_data.parquet")]
        output: PathBuf,

        /// Output directory. Defaults to the configured one (data/raw).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Page size.
        #[arg(long, default_value_t = EodRequest::DEFAULT_LIMIT)]
        limit: u32,

        /// Number of results to skip.
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Run the expectation suite against a Parquet file.
    Validate {
        /// Parquet file to validate.
        #[arg(long, default_value = "data/raw/stock_data.parquet")]
        input: PathBuf,

        /// Name of the expectation suite.
        #[arg(long, default_value = DEFAULT_SUITE_NAME)]
        suite_name: String,

        /// Also write the suite as JSON into this directory.
        #[arg(long)]
        save_suite: Option<PathBuf>,

        /// Write the full validation result as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit with status 1 when any expectation fails.
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pull {
            tickers,
            start_date,
            end_date,
            output,
            output_dir,
            limit,
            offset,
        } => {
            let settings = Settings::load(cli.config.as_deref())?;
            let path = run_pull(
                &settings, tickers, start_date, end_date, &output, output_dir, limit, offset,
            )?;
            println!("Saved to {}", path.display());
            Ok(())
        }
        Commands::Validate {
            input,
            suite_name,
            save_suite,
            report,
            fail_on_error,
        } => {
            let success =
                run_validate(&input, &suite_name, save_suite.as_deref(), report.as_deref())?;
            if fail_on_error && !success {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_pull(
    settings: &Settings,
    tickers: Option<Vec<String>>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    output: &Path,
    output_dir: Option<PathBuf>,
    limit: u32,
    offset: u32,
) -> Result<PathBuf> {
    tracing::debug!(?settings, "resolved settings");
    let symbols = tickers.unwrap_or_else(|| settings.tickers.clone());
    let request = EodRequest::new(symbols, start_date, end_date)
        .with_limit(limit)
        .with_offset(offset);

    let provider = MarketstackProvider::new(settings.base_url.clone())?;
    let records = fetch(&provider, settings.api_key.as_deref(), &request)?;
    let table = normalize(&records)?;

    let dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let path = output_path(&dir, output);
    persist(&table, &path).with_context(|| format!("persist {}", path.display()))?;
    Ok(path)
}

/// Returns whether every expectation passed.
fn run_validate(
    input: &Path,
    suite_name: &str,
    save_dir: Option<&Path>,
    report: Option<&Path>,
) -> Result<bool> {
    let table = load_table(input).with_context(|| format!("load {}", input.display()))?;
    let suite = build_suite(suite_name);

    if let Some(dir) = save_dir {
        save_suite(dir, &suite)?;
    }

    let result = validate(&table, &suite);
    print!("{}", render(&result));

    if let Some(path) = report {
        let json = result.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("write report {}", path.display()))?;
    }

    Ok(result.success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eodlab_core::data::RawEodRecord;

    fn record(date: &str, symbol: &str) -> RawEodRecord {
        RawEodRecord {
            date: Some(date.into()),
            symbol: Some(symbol.into()),
            open: Some(130.0),
            high: Some(131.0),
            low: Some(129.0),
            close: Some(130.5),
            volume: Some(1_000_000.0),
            adj_close: Some(130.5),
        }
    }

    #[test]
    fn pull_defaults() {
        let cli = Cli::try_parse_from(["eodlab", "pull"]).unwrap();
        match cli.command {
            Commands::Pull {
                tickers,
                start_date,
                end_date,
                output,
                output_dir,
                limit,
                offset,
            } => {
                assert_eq!(tickers, None);
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
                assert_eq!(end_date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
                assert_eq!(output, PathBuf::from("eod_data.parquet"));
                assert_eq!(output_dir, None);
                assert_eq!(limit, 1000);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn pull_tickers_accept_commas() {
        let cli = Cli::try_parse_from(["eodlab", "pull", "--tickers", "AAPL,MSFT"]).unwrap();
        let Commands::Pull { tickers, .. } = cli.command else {
            panic!("expected pull");
        };
        assert_eq!(tickers, Some(vec!["AAPL".to_string(), "MSFT".to_string()]));
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["eodlab", "pull", "--start-date", "01/02/2025"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["eodlab", "validate", "--config", "eodlab.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("eodlab.toml")));
    }

    #[test]
    fn validate_defaults() {
        let cli = Cli::try_parse_from(["eodlab", "validate"]).unwrap();
        let Commands::Validate {
            input,
            suite_name,
            save_suite,
            report,
            fail_on_error,
        } = cli.command
        else {
            panic!("expected validate");
        };
        assert_eq!(input, PathBuf::from("data/raw/stock_data.parquet"));
        assert_eq!(suite_name, "stock_data_expectation_suite");
        assert!(save_suite.is_none());
        assert!(report.is_none());
        assert!(!fail_on_error);
    }

    #[test]
    fn validate_writes_report_and_suite() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("eod.parquet");
        let table = normalize(&[record("2025-01-02", "AAPL"), record("2025-01-03", "AAPL")]).unwrap();
        persist(&table, &input).unwrap();

        let report = dir.path().join("report.json");
        let suites = dir.path().join("suites");
        let success = run_validate(&input, "s", Some(&suites), Some(&report)).unwrap();

        assert!(success);
        assert!(suites.join("s.json").exists());
        let json = std::fs::read_to_string(&report).unwrap();
        assert!(json.contains("\"suite_name\": \"s\""));
    }

    #[test]
    fn validate_reports_failures_without_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("eod.parquet");
        let table = normalize(&[record("2025-01-02", "SPY")]).unwrap();
        persist(&table, &input).unwrap();

        assert!(!run_validate(&input, "s", None, None).unwrap());
    }

    #[test]
    fn validate_missing_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_validate(&dir.path().join("absent.parquet"), "s", None, None).is_err());
    }
}
