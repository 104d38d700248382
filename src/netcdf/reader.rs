use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::debug;

use super::{decode_f64_into, Attribute, Header, NcArray, NcType, NetCdfError, Variable};

/// Records fetched per read when gathering record-variable elements
const RECORD_BATCH: usize = 64 * 1024;

/// An open NetCDF classic file
#[derive(Debug)]
pub struct NetCdfFile<R = BufReader<File>> {
    source: R,
    header: Header,
    file_len: u64,
    record_size: u64,
    raw: Vec<u8>,
}

impl NetCdfFile<BufReader<File>> {
    /// Open a file on disk and parse its header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NetCdfError> {
        let file = File::open(path.as_ref())?;
        debug!("Opened NetCDF file {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> NetCdfFile<R> {
    /// Parse the header from any seekable source
    pub fn from_reader(mut source: R) -> Result<Self, NetCdfError> {
        let file_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        let header = Header::read(&mut source, file_len)?;
        let record_size = header.record_size();
        Ok(Self {
            source,
            header,
            file_len,
            record_size,
            raw: Vec::new(),
        })
    }

    /// The parsed header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Look up a variable by name
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.header.variable(name)
    }

    /// Look up a global attribute by name
    pub fn global_attribute(&self, name: &str) -> Option<&Attribute> {
        self.header.attribute(name)
    }

    /// Release the file and return the underlying source
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Read every element of a variable, keeping its stored type
    pub fn read_all(&mut self, var: &Variable) -> Result<NcArray, NetCdfError> {
        self.read_raw(var, 0, var.len())?;
        Ok(NcArray::decode(var.nc_type, &self.raw))
    }

    /// Read elements `[start, start + count)` of a numeric variable as `f64`.
    ///
    /// Elements are addressed in row-major order over the whole variable.
    /// `out` is cleared first so it can be reused between calls.
    pub fn read_f64_into(
        &mut self,
        var: &Variable,
        start: usize,
        count: usize,
        out: &mut Vec<f64>,
    ) -> Result<(), NetCdfError> {
        if var.nc_type == NcType::Char {
            return Err(NetCdfError::TypeMismatch {
                variable: var.name.clone(),
                found: var.nc_type,
                expected: "a numeric type",
            });
        }
        self.read_raw(var, start, count)?;
        out.clear();
        out.reserve(count);
        decode_f64_into(var.nc_type, &self.raw, out);
        Ok(())
    }

    /// Read an integer variable as `i64`
    pub fn read_i64_all(&mut self, var: &Variable) -> Result<Vec<i64>, NetCdfError> {
        if !var.nc_type.is_integer() {
            return Err(NetCdfError::TypeMismatch {
                variable: var.name.clone(),
                found: var.nc_type,
                expected: "an integer type",
            });
        }
        let mut values = Vec::new();
        self.read_f64_into(var, 0, var.len(), &mut values)?;
        Ok(values.into_iter().map(|v| v as i64).collect())
    }

    /// Read a numeric variable as `f32`, narrowing doubles
    pub fn read_f32_all(&mut self, var: &Variable) -> Result<Vec<f32>, NetCdfError> {
        let mut values = Vec::new();
        self.read_f64_into(var, 0, var.len(), &mut values)?;
        Ok(values.into_iter().map(|v| v as f32).collect())
    }

    /// Make sure the bytes up to element `end` lie inside the file before allocating for them
    fn check_extent(&self, var: &Variable, end: usize, size: usize) -> Result<(), NetCdfError> {
        let last = (end - 1) as u64;
        let offset = if var.is_record {
            let slab = var.slab_len() as u64;
            (last / slab)
                .checked_mul(self.record_size)
                .and_then(|o| o.checked_add((last % slab + 1) * size as u64))
        } else {
            (last + 1).checked_mul(size as u64)
        };
        let needed = offset.and_then(|o| o.checked_add(var.begin));
        match needed {
            Some(needed) if needed <= self.file_len => Ok(()),
            _ => Err(NetCdfError::Truncated {
                variable: var.name.clone(),
                needed: needed.unwrap_or(u64::MAX),
                file_len: self.file_len,
            }),
        }
    }

    /// Gather the raw big-endian bytes of elements `[start, start + count)` into `self.raw`
    fn read_raw(&mut self, var: &Variable, start: usize, count: usize) -> Result<(), NetCdfError> {
        let len = var.len();
        let end = start.checked_add(count).filter(|&end| end <= len).ok_or_else(|| {
            NetCdfError::OutOfBounds {
                variable: var.name.clone(),
                start,
                end: start.saturating_add(count),
                len,
            }
        })?;

        let size = var.nc_type.size();
        self.raw.clear();
        if count == 0 {
            return Ok(());
        }
        self.check_extent(var, end, size)?;

        if !var.is_record {
            self.raw.resize(count * size, 0);
            self.source
                .seek(SeekFrom::Start(var.begin + (start * size) as u64))?;
            self.source.read_exact(&mut self.raw)?;
            return Ok(());
        }

        // Record variables: each record holds one slab of this variable,
        // followed by the slabs of the other record variables.
        let slab = var.slab_len();
        let slab_bytes = slab * size;
        let record_size = self.record_size as usize;
        let first_record = start / slab;
        let last_record = (end - 1) / slab;

        self.raw.reserve(count * size);
        let mut chunk = Vec::new();
        let mut record = first_record;
        while record <= last_record {
            let batch_end = (record + RECORD_BATCH).min(last_record + 1);
            let span = (batch_end - record - 1) * record_size + slab_bytes;
            chunk.resize(span, 0);
            self.source
                .seek(SeekFrom::Start(var.begin + (record * record_size) as u64))?;
            self.source.read_exact(&mut chunk)?;

            for r in record..batch_end {
                let base = (r - record) * record_size;
                let lo = if r == first_record { start - r * slab } else { 0 };
                let hi = if r == last_record { end - r * slab } else { slab };
                self.raw
                    .extend_from_slice(&chunk[base + lo * size..base + hi * size]);
            }
            record = batch_end;
        }
        Ok(())
    }
}
