use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mzscan::import::{ImportConfig, RawDataFileImportMethod, RepairWarning};
use mzscan::model::{RawDataFile, RawDataFileType};
use mzscan::store::{DataPointStoreFactory, StoreKind};

use super::config::Config;

/// What the import command reports about a file
#[derive(Debug, Serialize)]
struct ImportSummary {
    file: String,
    file_type: RawDataFileType,
    store: StoreKind,
    imported_at: String,
    elapsed_ms: u128,
    scans: usize,
    data_points: usize,
    retention_time_range: Option<(f32, f32)>,
    mz_range: Option<(f64, f64)>,
    spectrum_types: BTreeMap<String, usize>,
    warnings: Vec<String>,
}

impl ImportSummary {
    fn new(
        raw_file: &RawDataFile,
        store: StoreKind,
        warnings: &[RepairWarning],
        imported_at: String,
        elapsed: Duration,
    ) -> Self {
        let scans = raw_file.scans();
        let mut spectrum_types = BTreeMap::new();
        for scan in scans {
            if let Some(kind) = scan.spectrum_type {
                *spectrum_types.entry(kind.to_string()).or_insert(0) += 1;
            }
        }

        Self {
            file: raw_file.name().to_string(),
            file_type: raw_file.file_type(),
            store,
            imported_at,
            elapsed_ms: elapsed.as_millis(),
            scans: scans.len(),
            data_points: scans.iter().map(|s| s.data_point_count()).sum(),
            retention_time_range: min_max(scans.iter().filter_map(|s| s.retention_time())),
            mz_range: scans
                .iter()
                .filter_map(|s| s.mz_range())
                .fold(None, |acc, (lo, hi)| match acc {
                    None => Some((lo, hi)),
                    Some((a, b)) => Some((lo.min(a), hi.max(b))),
                }),
            spectrum_types,
            warnings: warnings.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Format the summary with colors when the console feature is enabled
    fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::style;

            let mut output = String::new();
            output.push_str(&format!("{}\n", style("mzscan Import Summary").bold().cyan()));
            output.push_str(&format!("{}\n", style("=====================").cyan()));
            output.push_str(&format!("{}: {}\n", style("File").bold(), self.file));
            output.push_str(&self.body());
            for warning in &self.warnings {
                output.push_str(&format!("{}: {}\n", style("WARNING").yellow().bold(), warning));
            }
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            self.to_string()
        }
    }

    fn body(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Type: {}\n", self.file_type));
        output.push_str(&format!("Store: {}\n", self.store));
        output.push_str(&format!("Scans: {}\n", self.scans));
        output.push_str(&format!("Data points: {}\n", self.data_points));
        if let Some((lo, hi)) = self.retention_time_range {
            output.push_str(&format!("Retention time: {:.2} - {:.2} s\n", lo, hi));
        }
        if let Some((lo, hi)) = self.mz_range {
            output.push_str(&format!("m/z range: {:.4} - {:.4}\n", lo, hi));
        }
        for (kind, count) in &self.spectrum_types {
            output.push_str(&format!("  {}: {} scans\n", kind, count));
        }
        output.push_str(&format!("Elapsed: {} ms\n", self.elapsed_ms));
        output
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mzscan Import Summary")?;
        writeln!(f, "=====================")?;
        writeln!(f, "File: {}", self.file)?;
        write!(f, "{}", self.body())?;
        for warning in &self.warnings {
            writeln!(f, "WARNING: {}", warning)?;
        }
        Ok(())
    }
}

fn min_max(values: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Import a raw data file and print a summary
pub fn run(
    input: PathBuf,
    store: Option<StoreKind>,
    scratch_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let file_config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    let kind = store.or(file_config.import.store).unwrap_or_default();
    let scratch_dir = scratch_dir.or(file_config.import.scratch_dir);
    let mut import_config = ImportConfig::default();
    if let Some(interval) = file_config.import.progress_interval {
        import_config = import_config.with_progress_interval(interval);
    }

    info!("Input: {}", input.display());
    info!("Data point store: {}", kind);
    if let Some(dir) = &scratch_dir {
        info!("Scratch directory: {}", dir.display());
    }

    let store = DataPointStoreFactory::global()
        .create(kind, scratch_dir.as_deref())
        .with_context(|| format!("Failed to create {} data point store", kind))?;

    let imported_at = chrono::Utc::now().to_rfc3339();
    let started = Instant::now();
    let mut importer =
        RawDataFileImportMethod::new(&input, Arc::clone(&store)).with_config(import_config);
    let mut raw_file = importer
        .execute()
        .with_context(|| format!("Failed to import {}", input.display()))?
        .context("Import was canceled")?;

    let summary = ImportSummary::new(
        &raw_file,
        kind,
        importer.warnings(),
        imported_at,
        started.elapsed(),
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.format_colored());
    }

    raw_file
        .dispose()
        .context("Failed to release imported data points")?;
    if kind != StoreKind::Memory {
        store.dispose().context("Failed to dispose data point store")?;
    }
    Ok(())
}
