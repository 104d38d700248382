//! Importer for ANDI-MS (NetCDF) raw files.
//!
//! The importer reads the five variables ANDI-MS uses for spectra
//! (`mass_values`, `intensity_values`, `scan_index`, `scan_acquisition_time`
//! and the optional `scale_factor` attributes), repairs missing scans, and
//! then emits one [`MsScan`] per entry of the scan index. Each scan's data
//! points go straight into the configured [`DataPointStore`]; only scan
//! metadata stays in memory.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use super::repair::{RepairWarning, ScanTable};
use super::{CancellationToken, ImportConfig, ImportError, ImportState, ImportStatus};
use crate::datapoints::DataPointContainer;
use crate::model::{
    ChromatographyInfo, MsFunction, MsScan, RawDataFile, RawDataFileType, SeparationType,
};
use crate::netcdf::{NetCdfFile, Variable};
use crate::spectrum_type::{SpectrumTypeClassifier, SpectrumTypeDetector};
use crate::store::DataPointStore;

/// Name of the flat m/z array
pub const MASS_VALUES: &str = "mass_values";
/// Name of the flat intensity array
pub const INTENSITY_VALUES: &str = "intensity_values";
/// Name of the per-scan start offset array
pub const SCAN_INDEX: &str = "scan_index";
/// Name of the per-scan retention time array
pub const SCAN_ACQUISITION_TIME: &str = "scan_acquisition_time";
/// Attribute holding the multiplier applied to raw samples
pub const SCALE_FACTOR: &str = "scale_factor";

/// Imports a single ANDI-MS file into a [`RawDataFile`]
pub struct NetCdfImportMethod<C = SpectrumTypeDetector> {
    source_file: PathBuf,
    store: Arc<dyn DataPointStore>,
    classifier: C,
    config: ImportConfig,
    status: ImportStatus,
    cancel: CancellationToken,
    warnings: Vec<RepairWarning>,
    partial_result: Option<RawDataFile>,
}

impl NetCdfImportMethod<SpectrumTypeDetector> {
    /// Create an importer writing data points into `store`
    pub fn new(source_file: impl Into<PathBuf>, store: Arc<dyn DataPointStore>) -> Self {
        Self {
            source_file: source_file.into(),
            store,
            classifier: SpectrumTypeDetector::default(),
            config: ImportConfig::default(),
            status: ImportStatus::new(),
            cancel: CancellationToken::new(),
            warnings: Vec::new(),
            partial_result: None,
        }
    }
}

impl<C: SpectrumTypeClassifier> NetCdfImportMethod<C> {
    /// Replace the spectrum type classifier
    pub fn with_classifier<D: SpectrumTypeClassifier>(
        self,
        classifier: D,
    ) -> NetCdfImportMethod<D> {
        NetCdfImportMethod {
            source_file: self.source_file,
            store: self.store,
            classifier,
            config: self.config,
            status: self.status,
            cancel: self.cancel,
            warnings: self.warnings,
            partial_result: self.partial_result,
        }
    }

    /// Set importer options
    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing cancellation token, e.g. one shared by several imports
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub(crate) fn with_status(mut self, status: ImportStatus) -> Self {
        self.status = status;
        self
    }

    /// Path of the file being imported
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Shared progress view; clones observe the same import
    pub fn status(&self) -> ImportStatus {
        self.status.clone()
    }

    /// Token that cancels this import from any thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fraction of scans parsed, `None` until the scan count is known
    pub fn finished_percentage(&self) -> Option<f32> {
        self.status.finished_percentage()
    }

    /// Problems found while repairing the scan table
    pub fn warnings(&self) -> &[RepairWarning] {
        &self.warnings
    }

    /// Scans completed before the import was canceled
    pub fn partial_result(&self) -> Option<&RawDataFile> {
        self.partial_result.as_ref()
    }

    /// Take ownership of the scans completed before cancellation
    pub fn take_partial_result(&mut self) -> Option<RawDataFile> {
        self.partial_result.take()
    }

    /// Run the import.
    ///
    /// Returns `Ok(None)` if the import was canceled; the scans completed up to
    /// that point are available from [`partial_result`](Self::partial_result).
    /// The source file is closed on every exit path.
    pub fn execute(&mut self) -> Result<Option<RawDataFile>, ImportError> {
        info!("Started parsing file {}", self.source_file.display());
        self.warnings.clear();
        self.partial_result = None;

        let outcome = self.run();
        if let Err(e) = &outcome {
            error!("Import of {} failed: {}", self.source_file.display(), e);
            self.status.set_state(ImportState::Failed);
        }
        outcome
    }

    fn run(&mut self) -> Result<Option<RawDataFile>, ImportError> {
        let mut file = NetCdfFile::open(&self.source_file)?;
        let layout = self.read_variables(&mut file)?;
        let total_scans = layout.scans.total_scans();
        self.status.set_total_scans(total_scans);
        self.status.set_state(ImportState::VariablesRead);

        let name = self
            .source_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_file.display().to_string());
        let mut raw_file = RawDataFile::new(
            name,
            Some(self.source_file.clone()),
            RawDataFileType::NetCdf,
            Arc::clone(&self.store),
        );

        self.status.set_state(ImportState::Scanning);
        let mut reader = ScanReader::new(layout);
        loop {
            let scan = match reader.read_next_scan(&mut file, &*self.store, &self.classifier) {
                Ok(Some(scan)) => scan,
                Ok(None) => break,
                Err(e) => {
                    // A failed import leaves nothing behind in the store
                    if let Err(dispose_err) = raw_file.dispose() {
                        warn!(
                            "Failed to release scans of {}: {}",
                            self.source_file.display(),
                            dispose_err
                        );
                    }
                    return Err(e);
                }
            };
            if self.cancel.is_cancelled() {
                // The decoded scan is discarded along with its stored points
                if let Some(handle) = scan.data_handle() {
                    if let Err(e) = self.store.remove(handle) {
                        warn!("Failed to release discarded scan {}: {}", scan.scan_number, e);
                    }
                }
                info!(
                    "Import of {} canceled after {} of {} scans",
                    self.source_file.display(),
                    raw_file.scans().len(),
                    total_scans
                );
                self.status.set_state(ImportState::Canceled);
                self.partial_result = Some(raw_file);
                return Ok(None);
            }
            raw_file.add_scan(scan);
            let parsed = self.status.increment_parsed();
            if self.config.progress_interval > 0 && parsed % self.config.progress_interval == 0 {
                info!(
                    "Progress: {}/{} scans ({:.1}%)",
                    parsed,
                    total_scans,
                    parsed as f64 * 100.0 / total_scans as f64
                );
            }
        }

        self.status.set_state(ImportState::Finished);
        info!(
            "Finished parsing {}, parsed {} scans",
            self.source_file.display(),
            raw_file.scans().len()
        );
        Ok(Some(raw_file))
    }

    /// Locate and validate the spectrum variables, then load and repair the scan table
    fn read_variables<R: Read + Seek>(
        &mut self,
        file: &mut NetCdfFile<R>,
    ) -> Result<ScanLayout, ImportError> {
        let (mass, mass_scale) = spectrum_variable(file, MASS_VALUES)?;
        let (intensity, intensity_scale) = spectrum_variable(file, INTENSITY_VALUES)?;
        if mass.len() != intensity.len() {
            return Err(ImportError::ArrayLengthMismatch {
                mass: mass.len(),
                intensity: intensity.len(),
            });
        }

        let scan_index_var = required_variable(file, SCAN_INDEX)?;
        let scan_index = file.read_i64_all(&scan_index_var)?;
        let time_var = required_variable(file, SCAN_ACQUISITION_TIME)?;
        let retention_times = file.read_f32_all(&time_var)?;
        debug!(
            "Found {} scans and {} data points (mass scale {}, intensity scale {})",
            scan_index.len(),
            mass.len(),
            mass_scale,
            intensity_scale
        );

        let mut scans = ScanTable::new(scan_index, mass.len(), retention_times)?;
        let report = scans.repair();
        for warning in &report.warnings {
            self.warnings.push(warning.clone());
        }

        Ok(ScanLayout {
            mass,
            intensity,
            mass_scale,
            intensity_scale,
            scans,
        })
    }
}

impl<C> std::fmt::Debug for NetCdfImportMethod<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfImportMethod")
            .field("source_file", &self.source_file)
            .field("store", &self.store.kind())
            .field("config", &self.config)
            .field("status", &self.status)
            .finish()
    }
}

fn required_variable<R: Read + Seek>(
    file: &NetCdfFile<R>,
    name: &'static str,
) -> Result<Variable, ImportError> {
    let var = file.find_variable(name).cloned().ok_or_else(|| {
        error!("Could not find variable {}", name);
        ImportError::MissingVariable(name)
    })?;
    if var.rank() != 1 {
        return Err(ImportError::UnexpectedRank {
            name,
            rank: var.rank(),
        });
    }
    Ok(var)
}

/// A flat sample array and its scale factor (1.0 when absent)
fn spectrum_variable<R: Read + Seek>(
    file: &NetCdfFile<R>,
    name: &'static str,
) -> Result<(Variable, f64), ImportError> {
    let var = required_variable(file, name)?;
    let scale = var
        .attribute(SCALE_FACTOR)
        .and_then(|a| a.as_f64())
        .unwrap_or(1.0);
    Ok((var, scale))
}

/// Everything needed to slice scans out of the flat arrays
#[derive(Debug)]
struct ScanLayout {
    mass: Variable,
    intensity: Variable,
    mass_scale: f64,
    intensity_scale: f64,
    scans: ScanTable,
}

/// Emits scans one at a time, reusing its buffers between scans
struct ScanReader {
    layout: ScanLayout,
    next_index: usize,
    mass_buf: Vec<f64>,
    intensity_buf: Vec<f64>,
    data_points: DataPointContainer,
}

impl ScanReader {
    fn new(layout: ScanLayout) -> Self {
        Self {
            layout,
            next_index: 0,
            mass_buf: Vec::new(),
            intensity_buf: Vec::new(),
            data_points: DataPointContainer::new(),
        }
    }

    fn read_next_scan<R, C>(
        &mut self,
        file: &mut NetCdfFile<R>,
        store: &dyn DataPointStore,
        classifier: &C,
    ) -> Result<Option<MsScan>, ImportError>
    where
        R: Read + Seek,
        C: SpectrumTypeClassifier,
    {
        let index = self.next_index;
        if index >= self.layout.scans.total_scans() {
            return Ok(None);
        }
        self.next_index += 1;
        let scan_number = index + 1;

        let retention_time = self
            .layout
            .scans
            .retention_time(index)
            .ok_or(ImportError::MissingRetentionTime(scan_number))?;

        let len = self.layout.mass.len();
        let (start, end) = self.layout.scans.scan_range(index).unwrap_or((-1, -1));
        if start < 0 || end < start || end as usize > len {
            return Err(ImportError::InvalidScanRange {
                scan_number,
                start,
                end,
                len,
            });
        }
        let (start, count) = (start as usize, (end - start) as usize);

        file.read_f64_into(&self.layout.mass, start, count, &mut self.mass_buf)?;
        file.read_f64_into(&self.layout.intensity, start, count, &mut self.intensity_buf)?;
        self.data_points.fill_scaled(
            &self.mass_buf,
            &self.intensity_buf,
            self.layout.mass_scale,
            self.layout.intensity_scale,
        );

        let mut scan = MsScan::new(scan_number as u32, MsFunction::new(1));
        scan.set_data_points(store, &self.data_points)?;
        scan.spectrum_type = Some(classifier.classify(&self.data_points));
        scan.chromatography_info = Some(ChromatographyInfo::new_1d(
            SeparationType::Unknown,
            retention_time,
        ));
        Ok(Some(scan))
    }
}
