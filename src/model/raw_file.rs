use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use super::{MsScan, RawDataFileType};
use crate::datapoints::DataPointContainer;
use crate::store::{DataPointStore, StoreError};

/// An imported raw data file: an ordered list of scans plus the store
/// holding their data points.
#[derive(Debug)]
pub struct RawDataFile {
    name: String,
    source_path: Option<PathBuf>,
    file_type: RawDataFileType,
    store: Arc<dyn DataPointStore>,
    scans: Vec<MsScan>,
}

impl RawDataFile {
    /// Create an empty file
    pub fn new(
        name: impl Into<String>,
        source_path: Option<PathBuf>,
        file_type: RawDataFileType,
        store: Arc<dyn DataPointStore>,
    ) -> Self {
        Self {
            name: name.into(),
            source_path,
            file_type,
            store,
            scans: Vec::new(),
        }
    }

    /// Display name (usually the source file name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the data was imported from
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Source format
    pub fn file_type(&self) -> RawDataFileType {
        self.file_type
    }

    /// Store holding the scans' data points
    pub fn store(&self) -> &Arc<dyn DataPointStore> {
        &self.store
    }

    /// Append a scan
    pub fn add_scan(&mut self, scan: MsScan) {
        self.scans.push(scan);
    }

    /// All scans in acquisition order
    pub fn scans(&self) -> &[MsScan] {
        &self.scans
    }

    /// Find a scan by its scan number
    pub fn scan(&self, scan_number: u32) -> Option<&MsScan> {
        self.scans.iter().find(|s| s.scan_number == scan_number)
    }

    /// Load a scan's data points into `buf`. Scans without data yield an empty buffer.
    pub fn read_data_points(
        &self,
        scan: &MsScan,
        buf: &mut DataPointContainer,
    ) -> Result<(), StoreError> {
        match scan.data_handle() {
            Some(handle) => self.store.retrieve_into(handle, buf),
            None => {
                buf.clear();
                Ok(())
            }
        }
    }

    /// Release the data points of every scan from the store.
    ///
    /// The store itself stays open; it may be shared with other files.
    pub fn dispose(&mut self) -> Result<(), StoreError> {
        debug!("Disposing raw data file {} ({} scans)", self.name, self.scans.len());
        let mut first_error = None;
        for scan in self.scans.drain(..) {
            if let Some(handle) = scan.data_handle() {
                if let Err(e) = self.store.remove(handle) {
                    warn!("Failed to release data of scan {}: {}", scan.scan_number, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
