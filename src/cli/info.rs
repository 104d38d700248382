use anyhow::{Context, Result};
use std::path::PathBuf;

use mzscan::import::{detect_file_type, INTENSITY_VALUES, MASS_VALUES, SCAN_INDEX};
use mzscan::netcdf::{NcArray, NetCdfFile};

/// Display the header of a NetCDF file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let file_type = detect_file_type(&file).context("Failed to identify file")?;
    let nc = NetCdfFile::open(&file).context("Failed to read NetCDF header")?;
    let header = nc.header();

    println!("NetCDF File Information");
    println!("=======================");
    println!("File: {}", file.display());
    println!("Type: {}", file_type);
    println!(
        "Format: {}",
        if header.version == 2 { "64-bit offset" } else { "classic" }
    );
    println!("Records: {}", header.num_records);
    println!();

    println!("Dimensions:");
    for dim in &header.dimensions {
        match dim.len {
            Some(len) => println!("  {} = {}", dim.name, len),
            None => println!("  {} = UNLIMITED ({} records)", dim.name, header.num_records),
        }
    }
    println!();

    if !header.attributes.is_empty() {
        println!("Global Attributes:");
        for attr in &header.attributes {
            println!("  {}: {}", attr.name, preview(&attr.value));
        }
        println!();
    }

    println!("Variables:");
    for (i, var) in header.variables.iter().enumerate() {
        let dims: Vec<&str> = var
            .dim_ids
            .iter()
            .filter_map(|&id| header.dimensions.get(id).map(|d| d.name.as_str()))
            .collect();
        println!(
            "  {:3}. {} {}({}) [{} elements]",
            i + 1,
            var.nc_type,
            var.name,
            dims.join(", "),
            var.len()
        );
        for attr in &var.attributes {
            println!("         {}: {}", attr.name, preview(&attr.value));
        }
    }

    if let (Some(index), Some(mass), Some(_)) = (
        nc.find_variable(SCAN_INDEX),
        nc.find_variable(MASS_VALUES),
        nc.find_variable(INTENSITY_VALUES),
    ) {
        println!();
        println!("ANDI-MS: {} scans, {} data points", index.len(), mass.len());
    }

    Ok(())
}

/// Short rendering of an attribute value
fn preview(value: &NcArray) -> String {
    if let Some(text) = value.as_text() {
        return if text.len() > 100 {
            let head: String = text.chars().take(100).collect();
            format!("\"{}...\" ({} chars)", head, text.len())
        } else {
            format!("\"{}\"", text)
        };
    }
    let shown: Vec<String> = (0..value.len().min(8))
        .filter_map(|i| value.get_f64(i))
        .map(|v| v.to_string())
        .collect();
    if value.len() > 8 {
        format!("[{}, ...] ({} values)", shown.join(", "), value.len())
    } else {
        shown.join(", ")
    }
}
