use crate::netcdf::NetCdfError;
use crate::store::StoreError;

/// Errors that abort an import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// A required variable is absent from the source file
    #[error("Required variable missing: {0}")]
    MissingVariable(&'static str),

    /// A variable does not have the expected number of dimensions
    #[error("Variable {name} has rank {rank}, expected 1")]
    UnexpectedRank {
        /// Variable name
        name: &'static str,
        /// Rank found in the file
        rank: usize,
    },

    /// The flat m/z and intensity arrays differ in length
    #[error("mass_values has {mass} elements but intensity_values has {intensity}")]
    ArrayLengthMismatch {
        /// Elements in the m/z array
        mass: usize,
        /// Elements in the intensity array
        intensity: usize,
    },

    /// The acquisition time array does not have one entry per scan
    #[error("scan_acquisition_time has {found} entries, expected one per scan ({expected})")]
    TimeArrayLength {
        /// Number of scans
        expected: usize,
        /// Entries found
        found: usize,
    },

    /// A scan's data range is negative, reversed or past the end of the arrays
    #[error("Invalid data range [{start}, {end}) for scan {scan_number} (arrays hold {len} points)")]
    InvalidScanRange {
        /// 1-based scan number
        scan_number: usize,
        /// Start offset from the scan index
        start: i64,
        /// End offset from the scan index
        end: i64,
        /// Length of the flat arrays
        len: usize,
    },

    /// A scan has no retention time after repair. Indicates a bug, not bad input.
    #[error("Could not find retention time for scan {0}")]
    MissingRetentionTime(usize),

    /// The file type is not recognized or not supported
    #[error("Unsupported raw data file: {0}")]
    UnsupportedFormat(String),

    /// Error reading the NetCDF container
    #[error("NetCDF error: {0}")]
    NetCdfError(#[from] NetCdfError),

    /// Error persisting data points
    #[error("Data point store error: {0}")]
    StoreError(#[from] StoreError),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
