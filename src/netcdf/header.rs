//! Header encoding and decoding.
//!
//! ```text
//! header  = magic numrecs dim_list gatt_list var_list
//! dim     = name dim_length
//! attr    = name nc_type nelems [values, padded to 4]
//! var     = name nelems [dimid ...] vatt_list nc_type vsize begin
//! ```

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::{pad4, Attribute, Dimension, NcArray, NcType, NetCdfError, Variable};

const NC_DIMENSION: u32 = 0x0A;
const NC_VARIABLE: u32 = 0x0B;
const NC_ATTRIBUTE: u32 = 0x0C;
const STREAMING: u32 = 0xFFFF_FFFF;

/// Parsed file header
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// 1 for classic, 2 for 64-bit offset
    pub version: u8,
    /// Number of records along the unlimited dimension
    pub num_records: usize,
    /// Dimensions in definition order
    pub dimensions: Vec<Dimension>,
    /// Global attributes
    pub attributes: Vec<Attribute>,
    /// Variables in definition order
    pub variables: Vec<Variable>,
}

impl Header {
    /// Parse a header.
    ///
    /// `file_len` is used to derive the record count of files written in
    /// streaming mode.
    pub fn read<R: Read>(r: &mut R, file_len: u64) -> Result<Self, NetCdfError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic[..3] != b"CDF" {
            return Err(NetCdfError::BadMagic([magic[0], magic[1], magic[2]]));
        }
        let version = magic[3];
        if version != 1 && version != 2 {
            return Err(NetCdfError::UnsupportedVersion(version));
        }

        let raw_num_records = r.read_u32::<BigEndian>()?;
        let dimensions = read_dimensions(r)?;
        let attributes = read_attributes(r)?;

        let mut header = Header {
            version,
            num_records: 0,
            dimensions,
            attributes,
            variables: Vec::new(),
        };
        header.variables = read_variables(r, &header.dimensions, version)?;

        header.num_records = if raw_num_records == STREAMING {
            header.streaming_record_count(file_len)
        } else {
            raw_num_records as usize
        };
        for var in header.variables.iter_mut().filter(|v| v.is_record) {
            var.shape[0] = header.num_records;
        }
        Ok(header)
    }

    /// Serialize the header
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"CDF")?;
        w.write_u8(self.version)?;
        w.write_u32::<BigEndian>(self.num_records as u32)?;

        write_list_tag(w, NC_DIMENSION, self.dimensions.len())?;
        for dim in &self.dimensions {
            write_name(w, &dim.name)?;
            w.write_u32::<BigEndian>(dim.len.unwrap_or(0) as u32)?;
        }

        write_attributes(w, &self.attributes)?;

        write_list_tag(w, NC_VARIABLE, self.variables.len())?;
        for var in &self.variables {
            write_name(w, &var.name)?;
            w.write_u32::<BigEndian>(var.dim_ids.len() as u32)?;
            for &id in &var.dim_ids {
                w.write_u32::<BigEndian>(id as u32)?;
            }
            write_attributes(w, &var.attributes)?;
            w.write_u32::<BigEndian>(var.nc_type.tag())?;
            w.write_u32::<BigEndian>(var.vsize.min(u32::MAX as u64) as u32)?;
            if self.version == 1 {
                w.write_u32::<BigEndian>(var.begin as u32)?;
            } else {
                w.write_u64::<BigEndian>(var.begin)?;
            }
        }
        Ok(())
    }

    /// Look up a dimension by name
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Look up a global attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Bytes between the starts of two consecutive records.
    ///
    /// Each record variable contributes its slab padded to four bytes, except
    /// when there is exactly one record variable, in which case no padding is
    /// used.
    pub fn record_size(&self) -> u64 {
        let record_vars: Vec<&Variable> = self.variables.iter().filter(|v| v.is_record).collect();
        match record_vars.as_slice() {
            [] => 0,
            [only] => (only.slab_len() * only.nc_type.size()) as u64,
            many => many
                .iter()
                .map(|v| pad4((v.slab_len() * v.nc_type.size()) as u64))
                .sum(),
        }
    }

    fn streaming_record_count(&self, file_len: u64) -> usize {
        let record_size = self.record_size();
        let first_record = self
            .variables
            .iter()
            .filter(|v| v.is_record)
            .map(|v| v.begin)
            .min();
        match first_record {
            Some(begin) if record_size > 0 && file_len > begin => {
                ((file_len - begin) / record_size) as usize
            }
            _ => 0,
        }
    }
}

/// Read exactly `n` bytes without trusting `n` for the allocation size
fn read_bytes<R: Read>(r: &mut R, n: u64) -> Result<Vec<u8>, NetCdfError> {
    let mut buf = Vec::new();
    r.take(n).read_to_end(&mut buf)?;
    if (buf.len() as u64) < n {
        return Err(NetCdfError::InvalidHeader(format!(
            "unexpected end of header: wanted {} bytes, found {}",
            n,
            buf.len()
        )));
    }
    Ok(buf)
}

fn skip_padding<R: Read>(r: &mut R, len: u64) -> Result<(), NetCdfError> {
    let padding = pad4(len) - len;
    if padding > 0 {
        read_bytes(r, padding)?;
    }
    Ok(())
}

fn read_name<R: Read>(r: &mut R) -> Result<String, NetCdfError> {
    let len = r.read_u32::<BigEndian>()? as u64;
    let bytes = read_bytes(r, len)?;
    skip_padding(r, len)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a list header, returning the element count (0 for ABSENT)
fn read_list_tag<R: Read>(r: &mut R, expected: u32) -> Result<usize, NetCdfError> {
    let tag = r.read_u32::<BigEndian>()?;
    let count = r.read_u32::<BigEndian>()? as usize;
    match tag {
        0 if count == 0 => Ok(0),
        t if t == expected => Ok(count),
        t => Err(NetCdfError::InvalidHeader(format!(
            "expected list tag {:#x}, found {:#x}",
            expected, t
        ))),
    }
}

fn read_dimensions<R: Read>(r: &mut R) -> Result<Vec<Dimension>, NetCdfError> {
    let count = read_list_tag(r, NC_DIMENSION)?;
    let mut dims = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name = read_name(r)?;
        let len = r.read_u32::<BigEndian>()? as usize;
        dims.push(Dimension {
            name,
            len: if len == 0 { None } else { Some(len) },
        });
    }
    if dims.iter().filter(|d| d.is_unlimited()).count() > 1 {
        return Err(NetCdfError::InvalidHeader(
            "more than one unlimited dimension".to_string(),
        ));
    }
    Ok(dims)
}

fn read_attributes<R: Read>(r: &mut R) -> Result<Vec<Attribute>, NetCdfError> {
    let count = read_list_tag(r, NC_ATTRIBUTE)?;
    let mut attrs = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name = read_name(r)?;
        let nc_type = NcType::from_tag(r.read_u32::<BigEndian>()?)?;
        let nelems = r.read_u32::<BigEndian>()? as u64;
        let len = nelems * nc_type.size() as u64;
        let bytes = read_bytes(r, len)?;
        skip_padding(r, len)?;
        attrs.push(Attribute {
            name,
            value: NcArray::decode(nc_type, &bytes),
        });
    }
    Ok(attrs)
}

fn read_variables<R: Read>(
    r: &mut R,
    dims: &[Dimension],
    version: u8,
) -> Result<Vec<Variable>, NetCdfError> {
    let count = read_list_tag(r, NC_VARIABLE)?;
    let mut vars = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name = read_name(r)?;
        let rank = r.read_u32::<BigEndian>()? as usize;
        let mut dim_ids = Vec::with_capacity(rank.min(64));
        let mut shape = Vec::with_capacity(rank.min(64));
        let mut is_record = false;
        for axis in 0..rank {
            let id = r.read_u32::<BigEndian>()? as usize;
            let dim = dims.get(id).ok_or_else(|| {
                NetCdfError::InvalidHeader(format!("variable {} uses unknown dimension {}", name, id))
            })?;
            match dim.len {
                Some(len) => shape.push(len),
                None if axis == 0 => {
                    is_record = true;
                    shape.push(0);
                }
                None => {
                    return Err(NetCdfError::InvalidHeader(format!(
                        "variable {} uses the unlimited dimension on axis {}",
                        name, axis
                    )))
                }
            }
            dim_ids.push(id);
        }
        let attributes = read_attributes(r)?;
        let nc_type = NcType::from_tag(r.read_u32::<BigEndian>()?)?;
        let vsize = r.read_u32::<BigEndian>()? as u64;
        let begin = if version == 1 {
            r.read_u32::<BigEndian>()? as u64
        } else {
            r.read_u64::<BigEndian>()?
        };
        vars.push(Variable {
            name,
            dim_ids,
            shape,
            attributes,
            nc_type,
            vsize,
            begin,
            is_record,
        });
    }
    Ok(vars)
}

fn write_list_tag<W: Write>(w: &mut W, tag: u32, count: usize) -> io::Result<()> {
    if count == 0 {
        w.write_u32::<BigEndian>(0)?;
        w.write_u32::<BigEndian>(0)
    } else {
        w.write_u32::<BigEndian>(tag)?;
        w.write_u32::<BigEndian>(count as u32)
    }
}

fn write_padding<W: Write>(w: &mut W, len: u64) -> io::Result<()> {
    for _ in len..pad4(len) {
        w.write_u8(0)?;
    }
    Ok(())
}

fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    w.write_u32::<BigEndian>(name.len() as u32)?;
    w.write_all(name.as_bytes())?;
    write_padding(w, name.len() as u64)
}

fn write_attributes<W: Write>(w: &mut W, attrs: &[Attribute]) -> io::Result<()> {
    write_list_tag(w, NC_ATTRIBUTE, attrs.len())?;
    let mut bytes = Vec::new();
    for attr in attrs {
        write_name(w, &attr.name)?;
        w.write_u32::<BigEndian>(attr.value.nc_type().tag())?;
        w.write_u32::<BigEndian>(attr.value.len() as u32)?;
        bytes.clear();
        attr.value.encode_range(0, attr.value.len(), &mut bytes);
        w.write_all(&bytes)?;
        write_padding(w, bytes.len() as u64)?;
    }
    Ok(())
}
