//! Raw data model: files, scans and their annotations

use std::fmt;

use serde::Serialize;

mod raw_file;
mod scan;

pub use raw_file::RawDataFile;
pub use scan::MsScan;

/// Source format of a raw data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RawDataFileType {
    /// ANDI-MS / NetCDF classic
    NetCdf,
}

impl fmt::Display for RawDataFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawDataFileType::NetCdf => f.write_str("NetCDF"),
        }
    }
}

/// How the points of a spectrum were acquired or processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MsSpectrumType {
    /// One point per detected peak
    Centroided,
    /// Profile data with points below a threshold removed
    Thresholded,
    /// Continuous profile data, including zero-intensity points
    Profile,
}

impl fmt::Display for MsSpectrumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MsSpectrumType::Centroided => "centroided",
            MsSpectrumType::Thresholded => "thresholded",
            MsSpectrumType::Profile => "profile",
        };
        f.write_str(name)
    }
}

/// Chromatographic separation technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeparationType {
    /// Not recorded in the source file
    #[default]
    Unknown,
    /// Gas chromatography
    Gc,
    /// Liquid chromatography
    Lc,
    /// Capillary electrophoresis
    Ce,
}

/// Acquisition function a scan belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MsFunction {
    /// Vendor function name, if any
    pub name: Option<String>,
    /// MS level (1 for full scans)
    pub ms_level: u8,
}

impl MsFunction {
    /// An unnamed function at the given MS level
    pub fn new(ms_level: u8) -> Self {
        Self {
            name: None,
            ms_level,
        }
    }
}

/// Position of a scan along the chromatographic axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChromatographyInfo {
    /// Separation technique
    pub separation_type: SeparationType,
    /// Retention time in the units of the source file (seconds for ANDI-MS)
    pub retention_time: f32,
}

impl ChromatographyInfo {
    /// One-dimensional chromatography coordinate
    pub fn new_1d(separation_type: SeparationType, retention_time: f32) -> Self {
        Self {
            separation_type,
            retention_time,
        }
    }
}
