//! Per-file conversion pipeline and batch driver.
//!
//! Each input is loaded, repaired, segmented and rendered on its own; a
//! failing file never stops the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::csv_loader::load_csv;
use crate::error::{ConvertError, Result};
use crate::gpx_writer::render_gpx;
use crate::kml_writer::{render_kml, write_kmz};
use crate::row_repair::repair;
use crate::track_segmenter::{segment, TIME_THRESHOLD_SECS};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Write `.kmz` instead of `.kml`.
    pub compress: bool,
    /// Also write a `.gpx` next to the KML output.
    pub gpx: bool,
    pub time_threshold_secs: i64,
    /// Files converted concurrently; `0` means one per CPU.
    pub jobs: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            compress: true,
            gpx: false,
            time_threshold_secs: TIME_THRESHOLD_SECS,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub kml_output: PathBuf,
    pub gpx_output: Option<PathBuf>,
    pub loaded_rows: usize,
    pub kept_rows: usize,
    pub tracks: usize,
    pub length_km: f64,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<ConversionReport>,
}

/// Row of the optional summary CSV.
#[derive(Debug, Serialize)]
struct SummaryRow {
    input: String,
    kml_output: String,
    gpx_output: String,
    loaded_rows: usize,
    kept_rows: usize,
    tracks: usize,
    length_km: String,
    status: String,
}

/// Input file name without directory or extension.
pub fn short_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn kml_output_path(input: &Path, compress: bool) -> PathBuf {
    input.with_extension(if compress { "kmz" } else { "kml" })
}

pub fn gpx_output_path(input: &Path) -> PathBuf {
    input.with_extension("gpx")
}

pub fn convert_file(input: &Path, options: &ConvertOptions) -> Result<ConversionReport> {
    let rows = load_csv(input)?;
    let loaded_rows = rows.len();
    let tracks = segment(repair(rows), options.time_threshold_secs);
    if tracks.is_empty() {
        return Err(ConvertError::NoData {
            path: input.to_path_buf(),
        });
    }

    let kml_output = kml_output_path(input, options.compress);
    info!("{} -> {}", input.display(), kml_output.display());
    let kml = render_kml(&tracks, &short_name(input))?;
    if options.compress {
        write_kmz(&kml_output, &kml)?;
    } else {
        fs::write(&kml_output, kml).map_err(|e| ConvertError::io(&kml_output, e))?;
    }

    let gpx_output = if options.gpx {
        let path = gpx_output_path(input);
        info!("{} -> {}", input.display(), path.display());
        let gpx = render_gpx(&tracks)?;
        fs::write(&path, gpx).map_err(|e| ConvertError::io(&path, e))?;
        Some(path)
    } else {
        None
    };

    Ok(ConversionReport {
        input: input.to_path_buf(),
        kml_output,
        gpx_output,
        loaded_rows,
        kept_rows: tracks.iter().map(|t| t.len()).sum(),
        tracks: tracks.len(),
        length_km: tracks.iter().map(|t| t.length_meters()).sum::<f64>() / 1000.0,
    })
}

/// Converts every input, keeping input order in the returned outcomes.
pub fn convert_all(inputs: &[PathBuf], options: &ConvertOptions) -> Vec<FileOutcome> {
    let convert = |input: &PathBuf| {
        let result = convert_file(input, options);
        if let Err(e) = &result {
            error!("Failed to convert {}: {}", input.display(), e);
        }
        FileOutcome {
            input: input.clone(),
            result,
        }
    };

    let jobs = if options.jobs == 0 {
        num_cpus::get()
    } else {
        options.jobs
    };
    if jobs <= 1 || inputs.len() <= 1 {
        return inputs.iter().map(convert).collect();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| inputs.par_iter().map(convert).collect()),
        Err(e) => {
            warn!("Could not start {} workers ({}), converting sequentially", jobs, e);
            inputs.iter().map(convert).collect()
        }
    }
}

/// Expands directories into the `.csv` files below them. Plain file paths
/// are kept as given.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                ConvertError::io(path, source)
            })?;
            if entry.file_type().is_file() && is_csv(entry.path()) {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        info!("Found {} csv files in {}", found.len(), path.display());
        inputs.extend(found);
    }
    Ok(inputs)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

pub fn write_summary(outcomes: &[FileOutcome], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for outcome in outcomes {
        let row = match &outcome.result {
            Ok(report) => SummaryRow {
                input: outcome.input.display().to_string(),
                kml_output: report.kml_output.display().to_string(),
                gpx_output: report
                    .gpx_output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                loaded_rows: report.loaded_rows,
                kept_rows: report.kept_rows,
                tracks: report.tracks,
                length_km: format!("{:.2}", report.length_km),
                status: "SUCCESS".to_string(),
            },
            Err(e) => SummaryRow {
                input: outcome.input.display().to_string(),
                kml_output: String::new(),
                gpx_output: String::new(),
                loaded_rows: 0,
                kept_rows: 0,
                tracks: 0,
                length_km: String::new(),
                status: format!("ERROR: {}", e),
            },
        };
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| ConvertError::io(path, e))?;
    info!("Conversion summary saved to {}", path.display());
    Ok(())
}

pub fn print_summary(outcomes: &[FileOutcome]) {
    let succeeded: Vec<&ConversionReport> =
        outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect();
    let failed = outcomes.len() - succeeded.len();

    println!("\n🎯 CONVERSION SUMMARY");
    println!("====================");
    println!("Files: {}", outcomes.len());
    println!("✅ Converted: {}", succeeded.len());
    println!("❌ Errors: {}", failed);
    if !succeeded.is_empty() {
        let tracks: usize = succeeded.iter().map(|r| r.tracks).sum();
        let points: usize = succeeded.iter().map(|r| r.kept_rows).sum();
        let km: f64 = succeeded.iter().map(|r| r.length_km).sum();
        println!("Tracks: {}, positions: {}, length: {:.2}km", tracks, points, km);
    }
}
