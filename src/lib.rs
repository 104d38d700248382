//! # mzscan
//!
//! Import of mass spectrometry raw files into an in-memory scan model whose
//! spectra live out of core.
//!
//! Raw files from long chromatographic runs easily hold more data points than
//! fit comfortably in memory. mzscan keeps only scan metadata (scan number,
//! retention time, spectrum type, a few summary statistics) in the
//! [`RawDataFile`](model::RawDataFile) and writes every scan's m/z and
//! intensity arrays to a [`DataPointStore`](store::DataPointStore) backend:
//! the process heap, an append-only temp file, or an embedded database.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mzscan::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = DataPointStoreFactory::global().temp_file_store()?;
//! let mut importer = NetCdfImportMethod::new("sample.cdf", store);
//!
//! if let Some(raw_file) = importer.execute()? {
//!     let mut points = DataPointContainer::new();
//!     for scan in raw_file.scans() {
//!         raw_file.read_data_points(scan, &mut points)?;
//!         println!(
//!             "scan {} at {:?}s: {} points, {:?}",
//!             scan.scan_number,
//!             scan.retention_time(),
//!             points.len(),
//!             scan.spectrum_type
//!         );
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`datapoints`]: reusable parallel m/z and intensity buffers
//! - [`store`]: the data point store trait, its three backends and the factory
//! - [`netcdf`]: reader and writer for the NetCDF classic container
//! - [`model`]: raw data files, scans and their annotations
//! - [`spectrum_type`]: centroided / thresholded / profile detection
//! - [`import`]: the ANDI-MS importer, scan table repair and progress reporting
//!
//! ## Supported Input Formats
//!
//! | Format | Magic | Notes |
//! |--------|-------|-------|
//! | ANDI-MS (NetCDF classic) | `CDF\x01` | Most common export from GC-MS vendors |
//! | ANDI-MS (NetCDF 64-bit offset) | `CDF\x02` | Files larger than 2 GiB |

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod datapoints;
pub mod import;
pub mod model;
pub mod netcdf;
pub mod spectrum_type;
pub mod store;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::datapoints::DataPointContainer;
    pub use crate::import::{
        detect_file_type, import_raw_file, CancellationToken, ImportConfig, ImportError,
        ImportState, ImportStatus, NetCdfImportMethod, RawDataFileImportMethod, RepairWarning,
    };
    pub use crate::model::{
        ChromatographyInfo, MsFunction, MsScan, MsSpectrumType, RawDataFile, RawDataFileType,
        SeparationType,
    };
    pub use crate::netcdf::{NetCdfBuilder, NetCdfError, NetCdfFile};
    pub use crate::spectrum_type::{SpectrumTypeClassifier, SpectrumTypeDetector};
    pub use crate::store::{
        DataPointStore, DataPointStoreFactory, StoreError, StoreHandle, StoreKind,
    };
}
