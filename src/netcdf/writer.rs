use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{pad4, Attribute, Dimension, Header, NcArray, NetCdfError, Variable};

#[derive(Debug, Clone)]
struct VariableDef {
    name: String,
    dim_ids: Vec<usize>,
    attributes: Vec<Attribute>,
    data: NcArray,
}

/// Builds a NetCDF classic (CDF-1) file in memory and writes it out.
///
/// ```rust
/// use mzscan::netcdf::{NcArray, NetCdfBuilder};
///
/// let mut builder = NetCdfBuilder::new();
/// let points = builder.add_dimension("point_number", 3);
/// let masses = builder.add_variable(
///     "mass_values",
///     &[points],
///     NcArray::Float(vec![100.0, 200.0, 300.0]),
/// )?;
/// builder.add_variable_attribute(masses, "scale_factor", NcArray::Double(vec![1.0]))?;
///
/// let mut bytes = Vec::new();
/// builder.write(&mut bytes)?;
/// assert_eq!(&bytes[..4], b"CDF\x01");
/// # Ok::<(), mzscan::netcdf::NetCdfError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetCdfBuilder {
    dimensions: Vec<Dimension>,
    attributes: Vec<Attribute>,
    variables: Vec<VariableDef>,
}

impl NetCdfBuilder {
    /// Create an empty file definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a fixed-length dimension and return its id
    pub fn add_dimension(&mut self, name: impl Into<String>, len: usize) -> usize {
        self.dimensions.push(Dimension {
            name: name.into(),
            len: Some(len),
        });
        self.dimensions.len() - 1
    }

    /// Define the unlimited (record) dimension and return its id
    pub fn add_unlimited_dimension(&mut self, name: impl Into<String>) -> Result<usize, NetCdfError> {
        if self.dimensions.iter().any(|d| d.is_unlimited()) {
            return Err(NetCdfError::InvalidDefinition(
                "only one unlimited dimension is allowed".to_string(),
            ));
        }
        self.dimensions.push(Dimension {
            name: name.into(),
            len: None,
        });
        Ok(self.dimensions.len() - 1)
    }

    /// Attach a global attribute
    pub fn add_global_attribute(&mut self, name: impl Into<String>, value: NcArray) {
        self.attributes.push(Attribute::new(name, value));
    }

    /// Define a variable and return its id.
    ///
    /// `data` holds every element in row-major order. For record variables
    /// the record count is inferred from the data length.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        dim_ids: &[usize],
        data: NcArray,
    ) -> Result<usize, NetCdfError> {
        let name = name.into();
        let mut fixed_len = 1usize;
        for (axis, &id) in dim_ids.iter().enumerate() {
            let dim = self.dimensions.get(id).ok_or_else(|| {
                NetCdfError::InvalidDefinition(format!("variable {} uses unknown dimension {}", name, id))
            })?;
            match dim.len {
                Some(len) => fixed_len *= len,
                None if axis == 0 => {}
                None => {
                    return Err(NetCdfError::InvalidDefinition(format!(
                        "variable {}: the unlimited dimension must come first",
                        name
                    )))
                }
            }
        }

        let is_record = self.is_record(dim_ids);
        let consistent = if is_record {
            fixed_len > 0 && data.len() % fixed_len == 0
        } else {
            data.len() == fixed_len
        };
        if !consistent {
            return Err(NetCdfError::InvalidDefinition(format!(
                "variable {} has {} values, which does not fit its dimensions",
                name,
                data.len()
            )));
        }

        self.variables.push(VariableDef {
            name,
            dim_ids: dim_ids.to_vec(),
            attributes: Vec::new(),
            data,
        });
        Ok(self.variables.len() - 1)
    }

    /// Attach an attribute to a variable
    pub fn add_variable_attribute(
        &mut self,
        var_id: usize,
        name: impl Into<String>,
        value: NcArray,
    ) -> Result<(), NetCdfError> {
        let var = self.variables.get_mut(var_id).ok_or_else(|| {
            NetCdfError::InvalidDefinition(format!("unknown variable id {}", var_id))
        })?;
        var.attributes.push(Attribute::new(name, value));
        Ok(())
    }

    /// Write the file to `path`
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), NetCdfError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the file
    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), NetCdfError> {
        let mut header = self.layout()?;
        let record_vars: Vec<usize> = (0..self.variables.len())
            .filter(|&i| header.variables[i].is_record)
            .collect();

        // Offset fields have a fixed width per version, so one extra pass settles the layout.
        if Self::assign_offsets(&mut header, &record_vars)? > u32::MAX as u64 {
            header.version = 2;
            Self::assign_offsets(&mut header, &record_vars)?;
        }
        let single_record_var = record_vars.len() == 1;

        header.write(w)?;

        let mut bytes = Vec::new();
        for (def, var) in self.variables.iter().zip(&header.variables) {
            if var.is_record {
                continue;
            }
            bytes.clear();
            def.data.encode_range(0, def.data.len(), &mut bytes);
            bytes.resize(pad4(bytes.len() as u64) as usize, 0);
            w.write_all(&bytes)?;
        }

        for record in 0..header.num_records {
            for &i in &record_vars {
                let slab = header.variables[i].slab_len();
                bytes.clear();
                self.variables[i]
                    .data
                    .encode_range(record * slab, slab, &mut bytes);
                if !single_record_var {
                    bytes.resize(pad4(bytes.len() as u64) as usize, 0);
                }
                w.write_all(&bytes)?;
            }
        }
        Ok(())
    }

    /// Fill in `begin` for every variable and return the largest offset assigned
    fn assign_offsets(header: &mut Header, record_vars: &[usize]) -> Result<u64, NetCdfError> {
        let mut probe = Vec::new();
        header.write(&mut probe)?;
        let mut offset = probe.len() as u64;
        let mut last_begin = 0;

        for var in header.variables.iter_mut().filter(|v| !v.is_record) {
            var.begin = offset;
            last_begin = offset;
            offset += var.vsize;
        }
        let single_record_var = record_vars.len() == 1;
        for &i in record_vars {
            let var = &mut header.variables[i];
            var.begin = offset;
            last_begin = offset;
            let slab_bytes = (var.slab_len() * var.nc_type.size()) as u64;
            offset += if single_record_var { slab_bytes } else { pad4(slab_bytes) };
        }
        Ok(last_begin)
    }

    fn is_record(&self, dim_ids: &[usize]) -> bool {
        dim_ids
            .first()
            .and_then(|&id| self.dimensions.get(id))
            .map_or(false, |d| d.is_unlimited())
    }

    /// Build the header with resolved shapes and sizes, offsets left at zero
    fn layout(&self) -> Result<Header, NetCdfError> {
        let mut num_records: Option<usize> = None;
        let mut variables = Vec::with_capacity(self.variables.len());

        for def in &self.variables {
            let is_record = self.is_record(&def.dim_ids);
            let mut shape: Vec<usize> = def
                .dim_ids
                .iter()
                .map(|&id| self.dimensions[id].len.unwrap_or(0))
                .collect();
            if is_record {
                let slab: usize = shape.iter().skip(1).product();
                let records = def.data.len() / slab;
                match num_records {
                    Some(n) if n != records => {
                        return Err(NetCdfError::InvalidDefinition(format!(
                            "record variable {} has {} records, others have {}",
                            def.name, records, n
                        )))
                    }
                    _ => num_records = Some(records),
                }
                shape[0] = records;
            }

            let nc_type = def.data.nc_type();
            let slab_len: usize = if is_record {
                shape.iter().skip(1).product()
            } else {
                shape.iter().product()
            };
            variables.push(Variable {
                name: def.name.clone(),
                dim_ids: def.dim_ids.clone(),
                shape,
                attributes: def.attributes.clone(),
                nc_type,
                vsize: pad4((slab_len * nc_type.size()) as u64),
                begin: 0,
                is_record,
            });
        }

        Ok(Header {
            version: 1,
            num_records: num_records.unwrap_or(0),
            dimensions: self.dimensions.clone(),
            attributes: self.attributes.clone(),
            variables,
        })
    }
}
