use serde::Serialize;

use super::{ChromatographyInfo, MsFunction, MsSpectrumType};
use crate::datapoints::DataPointContainer;
use crate::store::{DataPointStore, StoreError, StoreHandle};

/// One acquired spectrum.
///
/// The data points themselves live in a [`DataPointStore`]; the scan keeps
/// the handle plus a few summary values computed when the points were stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsScan {
    /// 1-based scan number
    pub scan_number: u32,
    /// Acquisition function
    pub ms_function: MsFunction,
    /// Centroided / thresholded / profile, once classified
    pub spectrum_type: Option<MsSpectrumType>,
    /// Retention time coordinate
    pub chromatography_info: Option<ChromatographyInfo>,
    #[serde(skip)]
    data_handle: Option<StoreHandle>,
    data_point_count: usize,
    mz_range: Option<(f64, f64)>,
    total_ion_current: f64,
}

impl MsScan {
    /// Create a scan without data points
    pub fn new(scan_number: u32, ms_function: MsFunction) -> Self {
        Self {
            scan_number,
            ms_function,
            spectrum_type: None,
            chromatography_info: None,
            data_handle: None,
            data_point_count: 0,
            mz_range: None,
            total_ion_current: 0.0,
        }
    }

    /// Store a copy of `data` and attach it to this scan.
    ///
    /// Any previously attached record is left in the store; callers replacing
    /// data should remove the old handle themselves.
    pub fn set_data_points(
        &mut self,
        store: &dyn DataPointStore,
        data: &DataPointContainer,
    ) -> Result<StoreHandle, StoreError> {
        let handle = store.store(data)?;
        self.data_handle = Some(handle);
        self.data_point_count = data.len();
        self.mz_range = data.mz_range();
        self.total_ion_current = data.total_ion_current();
        Ok(handle)
    }

    /// Handle of the stored data points
    pub fn data_handle(&self) -> Option<StoreHandle> {
        self.data_handle
    }

    /// Number of data points
    pub fn data_point_count(&self) -> usize {
        self.data_point_count
    }

    /// Lowest and highest m/z
    pub fn mz_range(&self) -> Option<(f64, f64)> {
        self.mz_range
    }

    /// Sum of intensities
    pub fn total_ion_current(&self) -> f64 {
        self.total_ion_current
    }

    /// Retention time, if known
    pub fn retention_time(&self) -> Option<f32> {
        self.chromatography_info.map(|c| c.retention_time)
    }
}
