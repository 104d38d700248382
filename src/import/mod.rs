//! Raw data file import
//!
//! [`NetCdfImportMethod`] turns an ANDI-MS NetCDF file into a
//! [`RawDataFile`](crate::model::RawDataFile) whose data points live in a
//! [`DataPointStore`](crate::store::DataPointStore). Imports report progress
//! through a shared [`ImportStatus`] and can be stopped from another thread
//! with a [`CancellationToken`].
//!
//! # Example
//!
//! ```no_run
//! use mzscan::import::NetCdfImportMethod;
//! use mzscan::store::DataPointStoreFactory;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = DataPointStoreFactory::global().temp_file_store()?;
//! let mut importer = NetCdfImportMethod::new("run01.cdf", store);
//! if let Some(raw_file) = importer.execute()? {
//!     println!("{} scans", raw_file.scans().len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod netcdf;
mod repair;


use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use log::error;
use serde::{Deserialize, Serialize};

pub use error::ImportError;
pub use netcdf::{
    NetCdfImportMethod, INTENSITY_VALUES, MASS_VALUES, SCALE_FACTOR, SCAN_ACQUISITION_TIME,
    SCAN_INDEX,
};
pub use repair::{RepairReport, RepairWarning, ScanTable};

use crate::model::{RawDataFile, RawDataFileType};
use crate::store::DataPointStore;

/// Default number of scans between progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: usize = 500;

/// Importer options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Log progress every this many scans; 0 disables progress logging
    pub progress_interval: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ImportConfig {
    /// Set the progress logging interval
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Lifecycle of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportState {
    /// Not started
    Created,
    /// Header variables read and the scan table repaired
    VariablesRead,
    /// Emitting scans
    Scanning,
    /// All scans imported
    Finished,
    /// Stopped on request
    Canceled,
    /// Stopped by an error
    Failed,
}

impl ImportState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ImportState::VariablesRead,
            2 => ImportState::Scanning,
            3 => ImportState::Finished,
            4 => ImportState::Canceled,
            5 => ImportState::Failed,
            _ => ImportState::Created,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ImportState::Created => 0,
            ImportState::VariablesRead => 1,
            ImportState::Scanning => 2,
            ImportState::Finished => 3,
            ImportState::Canceled => 4,
            ImportState::Failed => 5,
        }
    }
}

#[derive(Debug, Default)]
struct StatusInner {
    state: AtomicU8,
    total_known: AtomicBool,
    total_scans: AtomicUsize,
    parsed_scans: AtomicUsize,
}

/// Progress of an import, readable from any thread while it runs
#[derive(Debug, Clone, Default)]
pub struct ImportStatus {
    inner: Arc<StatusInner>,
}

impl ImportStatus {
    /// Fresh status in the `Created` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> ImportState {
        ImportState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Number of scans in the file, once the header has been read
    pub fn total_scans(&self) -> Option<usize> {
        if self.inner.total_known.load(Ordering::Acquire) {
            Some(self.inner.total_scans.load(Ordering::Acquire))
        } else {
            None
        }
    }

    /// Scans appended to the result so far
    pub fn parsed_scans(&self) -> usize {
        self.inner.parsed_scans.load(Ordering::Acquire)
    }

    /// `parsed / total`, or `None` while the total is unknown or zero
    pub fn finished_percentage(&self) -> Option<f32> {
        match self.total_scans() {
            Some(total) if total > 0 => Some(self.parsed_scans() as f32 / total as f32),
            _ => None,
        }
    }

    pub(crate) fn set_state(&self, state: ImportState) {
        self.inner.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn set_total_scans(&self, total: usize) {
        self.inner.parsed_scans.store(0, Ordering::Release);
        self.inner.total_scans.store(total, Ordering::Release);
        self.inner.total_known.store(true, Ordering::Release);
    }

    /// Returns the new parsed count
    pub(crate) fn increment_parsed(&self) -> usize {
        self.inner.parsed_scans.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Cooperative cancellation flag shared between an import and its controller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// New, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every import holding this token to stop at the next scan
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Identify a raw data file by its leading bytes
pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<RawDataFileType, ImportError> {
    let path = path.as_ref();
    let mut magic = Vec::with_capacity(4);
    File::open(path)?.take(4).read_to_end(&mut magic)?;

    match magic.as_slice() {
        [b'C', b'D', b'F', 1] | [b'C', b'D', b'F', 2] => Ok(RawDataFileType::NetCdf),
        [0x89, b'H', b'D', b'F'] => Err(ImportError::UnsupportedFormat(format!(
            "{} is a NetCDF-4/HDF5 file; only classic NetCDF is supported",
            path.display()
        ))),
        _ => Err(ImportError::UnsupportedFormat(format!(
            "{} is not a recognized raw data file",
            path.display()
        ))),
    }
}

/// Imports any supported raw data file, picking the importer from the file's contents
#[derive(Debug)]
pub struct RawDataFileImportMethod {
    source_file: PathBuf,
    store: Arc<dyn DataPointStore>,
    config: ImportConfig,
    status: ImportStatus,
    cancel: CancellationToken,
    warnings: Vec<RepairWarning>,
    partial_result: Option<RawDataFile>,
}

impl RawDataFileImportMethod {
    /// Create an importer writing data points into `store`
    pub fn new(source_file: impl Into<PathBuf>, store: Arc<dyn DataPointStore>) -> Self {
        Self {
            source_file: source_file.into(),
            store,
            config: ImportConfig::default(),
            status: ImportStatus::new(),
            cancel: CancellationToken::new(),
            warnings: Vec::new(),
            partial_result: None,
        }
    }

    /// Set importer options
    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing cancellation token
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Shared progress view
    pub fn status(&self) -> ImportStatus {
        self.status.clone()
    }

    /// Token that cancels this import
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Problems found while repairing the scan table
    pub fn warnings(&self) -> &[RepairWarning] {
        &self.warnings
    }

    /// Scans completed before the import was canceled
    pub fn partial_result(&self) -> Option<&RawDataFile> {
        self.partial_result.as_ref()
    }

    /// Detect the file type and run the matching importer.
    ///
    /// Returns `Ok(None)` if the import was canceled.
    pub fn execute(&mut self) -> Result<Option<RawDataFile>, ImportError> {
        let file_type = detect_file_type(&self.source_file).map_err(|e| {
            error!("Cannot import {}: {}", self.source_file.display(), e);
            self.status.set_state(ImportState::Failed);
            e
        })?;

        match file_type {
            RawDataFileType::NetCdf => {
                let mut method =
                    NetCdfImportMethod::new(self.source_file.clone(), Arc::clone(&self.store))
                        .with_config(self.config.clone())
                        .with_cancellation_token(self.cancel.clone())
                        .with_status(self.status.clone());
                let outcome = method.execute();
                self.warnings = method.warnings().to_vec();
                self.partial_result = method.take_partial_result();
                outcome
            }
        }
    }
}

/// Import a raw data file with default options.
///
/// Returns `Ok(None)` only if the import was canceled, which cannot happen
/// through this function; use [`RawDataFileImportMethod`] for cancellable imports.
pub fn import_raw_file<P: AsRef<Path>>(
    path: P,
    store: Arc<dyn DataPointStore>,
) -> Result<Option<RawDataFile>, ImportError> {
    RawDataFileImportMethod::new(path.as_ref(), store).execute()
}
