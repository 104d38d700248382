//! NetCDF classic format support
//!
//! Reader and writer for the NetCDF-3 "classic" (`CDF\x01`) and "64-bit
//! offset" (`CDF\x02`) formats, the containers used by ANDI-MS (`.cdf`)
//! mass spectrometry files. All values are big-endian. A file consists of a
//! header describing dimensions, attributes and variables, followed by the
//! data of fixed-size variables and then the interleaved records of variables
//! that run along the unlimited dimension.
//!
//! Only the parts of the format needed to read flat numeric arrays are
//! exposed; NetCDF-4 (HDF5) files are not supported.
//!
//! ```rust,no_run
//! use mzscan::netcdf::NetCdfFile;
//!
//! let mut file = NetCdfFile::open("run01.cdf")?;
//! let masses = file.find_variable("mass_values").cloned();
//! if let Some(var) = masses {
//!     let mut first_scan = Vec::new();
//!     file.read_f64_into(&var, 0, 100.min(var.len()), &mut first_scan)?;
//! }
//! # Ok::<(), mzscan::netcdf::NetCdfError>(())
//! ```

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

mod error;
mod header;
mod reader;
mod writer;

#[cfg(test)]
mod tests;

pub use error::NetCdfError;
pub use header::Header;
pub use reader::NetCdfFile;
pub use writer::NetCdfBuilder;

/// External data types of the classic format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NcType {
    /// Signed 8-bit integer
    Byte,
    /// 8-bit character
    Char,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int,
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
}

impl NcType {
    /// Decode a type tag from the header
    pub fn from_tag(tag: u32) -> Result<Self, NetCdfError> {
        match tag {
            1 => Ok(NcType::Byte),
            2 => Ok(NcType::Char),
            3 => Ok(NcType::Short),
            4 => Ok(NcType::Int),
            5 => Ok(NcType::Float),
            6 => Ok(NcType::Double),
            other => Err(NetCdfError::UnknownType(other)),
        }
    }

    /// Type tag written to the header
    pub fn tag(&self) -> u32 {
        match self {
            NcType::Byte => 1,
            NcType::Char => 2,
            NcType::Short => 3,
            NcType::Int => 4,
            NcType::Float => 5,
            NcType::Double => 6,
        }
    }

    /// Size of one value in bytes
    pub fn size(&self) -> usize {
        match self {
            NcType::Byte | NcType::Char => 1,
            NcType::Short => 2,
            NcType::Int | NcType::Float => 4,
            NcType::Double => 8,
        }
    }

    /// Returns true for the integer types
    pub fn is_integer(&self) -> bool {
        matches!(self, NcType::Byte | NcType::Short | NcType::Int)
    }
}

impl fmt::Display for NcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NcType::Byte => "byte",
            NcType::Char => "char",
            NcType::Short => "short",
            NcType::Int => "int",
            NcType::Float => "float",
            NcType::Double => "double",
        };
        f.write_str(name)
    }
}

/// A typed array of values, as stored in a variable or attribute
#[derive(Debug, Clone, PartialEq)]
pub enum NcArray {
    /// Signed 8-bit integers
    Byte(Vec<i8>),
    /// Characters (raw bytes)
    Char(Vec<u8>),
    /// Signed 16-bit integers
    Short(Vec<i16>),
    /// Signed 32-bit integers
    Int(Vec<i32>),
    /// 32-bit floats
    Float(Vec<f32>),
    /// 64-bit floats
    Double(Vec<f64>),
}

impl NcArray {
    /// Text value stored as a char array
    pub fn text(s: &str) -> Self {
        NcArray::Char(s.as_bytes().to_vec())
    }

    /// Element type
    pub fn nc_type(&self) -> NcType {
        match self {
            NcArray::Byte(_) => NcType::Byte,
            NcArray::Char(_) => NcType::Char,
            NcArray::Short(_) => NcType::Short,
            NcArray::Int(_) => NcType::Int,
            NcArray::Float(_) => NcType::Float,
            NcArray::Double(_) => NcType::Double,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            NcArray::Byte(v) => v.len(),
            NcArray::Char(v) => v.len(),
            NcArray::Short(v) => v.len(),
            NcArray::Int(v) => v.len(),
            NcArray::Float(v) => v.len(),
            NcArray::Double(v) => v.len(),
        }
    }

    /// Returns true if there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` converted to `f64`. Char arrays have no numeric value.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            NcArray::Byte(v) => v.get(i).map(|&x| x as f64),
            NcArray::Char(_) => None,
            NcArray::Short(v) => v.get(i).map(|&x| x as f64),
            NcArray::Int(v) => v.get(i).map(|&x| x as f64),
            NcArray::Float(v) => v.get(i).map(|&x| x as f64),
            NcArray::Double(v) => v.get(i).copied(),
        }
    }

    /// Char array contents as text, without trailing NUL padding
    pub fn as_text(&self) -> Option<String> {
        match self {
            NcArray::Char(bytes) => {
                let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            _ => None,
        }
    }

    pub(crate) fn decode(nc_type: NcType, bytes: &[u8]) -> Self {
        match nc_type {
            NcType::Byte => NcArray::Byte(bytes.iter().map(|&b| b as i8).collect()),
            NcType::Char => NcArray::Char(bytes.to_vec()),
            NcType::Short => NcArray::Short(bytes.chunks_exact(2).map(BigEndian::read_i16).collect()),
            NcType::Int => NcArray::Int(bytes.chunks_exact(4).map(BigEndian::read_i32).collect()),
            NcType::Float => NcArray::Float(bytes.chunks_exact(4).map(BigEndian::read_f32).collect()),
            NcType::Double => {
                NcArray::Double(bytes.chunks_exact(8).map(BigEndian::read_f64).collect())
            }
        }
    }

    /// Append the big-endian encoding of elements `[start, start + count)` to `out`
    pub(crate) fn encode_range(&self, start: usize, count: usize, out: &mut Vec<u8>) {
        let end = start + count;
        match self {
            NcArray::Byte(v) => out.extend(v[start..end].iter().map(|&x| x as u8)),
            NcArray::Char(v) => out.extend_from_slice(&v[start..end]),
            NcArray::Short(v) => v[start..end]
                .iter()
                .for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
            NcArray::Int(v) => v[start..end]
                .iter()
                .for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
            NcArray::Float(v) => v[start..end]
                .iter()
                .for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
            NcArray::Double(v) => v[start..end]
                .iter()
                .for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        }
    }
}

/// Convert big-endian raw values of `nc_type` to `f64`, appending to `out`
pub(crate) fn decode_f64_into(nc_type: NcType, bytes: &[u8], out: &mut Vec<f64>) {
    match nc_type {
        NcType::Byte | NcType::Char => out.extend(bytes.iter().map(|&b| b as i8 as f64)),
        NcType::Short => out.extend(bytes.chunks_exact(2).map(|c| BigEndian::read_i16(c) as f64)),
        NcType::Int => out.extend(bytes.chunks_exact(4).map(|c| BigEndian::read_i32(c) as f64)),
        NcType::Float => out.extend(bytes.chunks_exact(4).map(|c| BigEndian::read_f32(c) as f64)),
        NcType::Double => out.extend(bytes.chunks_exact(8).map(BigEndian::read_f64)),
    }
}

/// Round up to the next multiple of four
pub(crate) fn pad4(n: u64) -> u64 {
    (n + 3) & !3
}

/// A named dimension. `len` is `None` for the unlimited (record) dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Dimension name
    pub name: String,
    /// Fixed length, or `None` for the unlimited dimension
    pub len: Option<usize>,
}

impl Dimension {
    /// Returns true for the record dimension
    pub fn is_unlimited(&self) -> bool {
        self.len.is_none()
    }
}

/// A named attribute attached to the file or to a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute values
    pub value: NcArray,
}

impl Attribute {
    /// Create an attribute
    pub fn new(name: impl Into<String>, value: NcArray) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// First value as `f64`, for numeric attributes
    pub fn as_f64(&self) -> Option<f64> {
        self.value.get_f64(0)
    }

    /// Text value, for char attributes
    pub fn as_text(&self) -> Option<String> {
        self.value.as_text()
    }
}

/// A variable as described by the file header
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Ids of the dimensions spanned, outermost first
    pub dim_ids: Vec<usize>,
    /// Resolved shape; the record dimension uses the file's record count
    pub shape: Vec<usize>,
    /// Variable attributes
    pub attributes: Vec<Attribute>,
    /// Element type
    pub nc_type: NcType,
    /// Size field from the header (bytes per record for record variables)
    pub vsize: u64,
    /// Offset of the first byte of data (of the first record for record variables)
    pub begin: u64,
    /// Whether the variable runs along the unlimited dimension
    pub is_record: bool,
}

impl Variable {
    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns true if the variable holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Elements per record (or in total, for fixed-size variables)
    pub(crate) fn slab_len(&self) -> usize {
        if self.is_record {
            self.shape.iter().skip(1).product()
        } else {
            self.len()
        }
    }
}
