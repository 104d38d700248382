/// Errors that can occur while reading or writing NetCDF files
#[derive(Debug, thiserror::Error)]
pub enum NetCdfError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file does not start with the `CDF` signature
    #[error("Not a NetCDF classic file (magic bytes {0:02x?})")]
    BadMagic([u8; 3]),

    /// NetCDF version byte other than 1 (classic) or 2 (64-bit offset)
    #[error("Unsupported NetCDF version {0}")]
    UnsupportedVersion(u8),

    /// Malformed header
    #[error("Invalid NetCDF header: {0}")]
    InvalidHeader(String),

    /// Unknown external type tag
    #[error("Unknown NetCDF type tag {0}")]
    UnknownType(u32),

    /// Read outside the bounds of a variable
    #[error("Range [{start}, {end}) is out of bounds for variable {variable} with {len} elements")]
    OutOfBounds {
        /// Variable being read
        variable: String,
        /// First requested element
        start: usize,
        /// One past the last requested element
        end: usize,
        /// Number of elements in the variable
        len: usize,
    },

    /// The header places variable data past the end of the file
    #[error("Variable {variable} needs {needed} bytes but the file has only {file_len}")]
    Truncated {
        /// Variable being read
        variable: String,
        /// File offset one past the last byte requested
        needed: u64,
        /// Size of the file
        file_len: u64,
    },

    /// A variable or attribute has a type the caller cannot use
    #[error("Variable {variable} has type {found}, expected {expected}")]
    TypeMismatch {
        /// Variable or attribute name
        variable: String,
        /// Type found in the file
        found: super::NcType,
        /// Description of what was expected
        expected: &'static str,
    },

    /// A file definition passed to the writer is inconsistent
    #[error("Invalid NetCDF definition: {0}")]
    InvalidDefinition(String),
}
