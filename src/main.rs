use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use tracing::error;
use tracing_subscriber::EnvFilter;

use csv_to_kml::converter::{collect_inputs, convert_all, print_summary, write_summary};
use csv_to_kml::track_segmenter::TIME_THRESHOLD_SECS;
use csv_to_kml::ConvertOptions;

const EXIT_USAGE: u8 = 1;
const EXIT_CONVERSION: u8 = 2;
const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Parser, Debug)]
#[command(author, version, about = "Converts position-logger CSV files into KML/KMZ and GPX", long_about = None)]
struct Cli {
    /// CSV files, or directories to search for *.csv files
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    inputs: Vec<PathBuf>,

    /// Generate uncompressed KML files instead of KMZ
    #[arg(short = 'Z', long, action = ArgAction::SetTrue)]
    no_zip: bool,

    /// Generate basic GPX files too
    #[arg(short = 'g', long, action = ArgAction::SetTrue)]
    gpx: bool,

    /// Seconds between two rows that start a new track
    #[arg(long, default_value_t = TIME_THRESHOLD_SECS)]
    threshold: i64,

    /// Files converted in parallel (0 = one per CPU)
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Write a per-file conversion summary CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    summary: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    for input in &cli.inputs {
        if !input.is_file() && !input.is_dir() {
            error!("Invalid input {:?}.", input);
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_CONVERSION)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let inputs = collect_inputs(&cli.inputs).context("collecting input files")?;
    if inputs.is_empty() {
        error!("No input. Please specify *.csv files.");
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let options = ConvertOptions {
        compress: !cli.no_zip,
        gpx: cli.gpx,
        time_threshold_secs: cli.threshold,
        jobs: cli.jobs,
    };
    let outcomes = convert_all(&inputs, &options);

    if let Some(path) = &cli.summary {
        write_summary(&outcomes, path)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }
    print_summary(&outcomes);

    if outcomes.iter().any(|o| o.result.is_err()) {
        Ok(ExitCode::from(EXIT_CONVERSION))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
