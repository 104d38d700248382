//! Centroided / thresholded / profile classification of spectra

use crate::datapoints::DataPointContainer;
use crate::model::MsSpectrumType;

/// Decides what kind of spectrum a set of data points is.
///
/// Implementations must be pure: the same points always give the same
/// answer. Any `Fn(&DataPointContainer) -> MsSpectrumType` closure is a
/// classifier.
pub trait SpectrumTypeClassifier {
    /// Classify one scan's data points
    fn classify(&self, data: &DataPointContainer) -> MsSpectrumType;
}

impl<F> SpectrumTypeClassifier for F
where
    F: Fn(&DataPointContainer) -> MsSpectrumType,
{
    fn classify(&self, data: &DataPointContainer) -> MsSpectrumType {
        self(data)
    }
}

/// Default classifier, based on the shape of the base peak.
///
/// Profile data samples every peak at regular m/z steps, so the base peak is
/// covered by several consecutive points above half its height. Such spectra
/// are [`Profile`](MsSpectrumType::Profile) when they still contain
/// zero-intensity points and [`Thresholded`](MsSpectrumType::Thresholded)
/// when those were removed. Everything else is
/// [`Centroided`](MsSpectrumType::Centroided).
#[derive(Debug, Clone, Copy)]
pub struct SpectrumTypeDetector {
    /// Spectra with fewer points are always centroided
    pub min_points: usize,
    /// Points at or above half height needed for a profile-shaped base peak
    pub min_peak_points: usize,
    /// Largest allowed ratio between the widest and narrowest m/z step inside the base peak
    pub max_spacing_ratio: f64,
}

impl Default for SpectrumTypeDetector {
    fn default() -> Self {
        Self {
            min_points: 5,
            min_peak_points: 4,
            max_spacing_ratio: 2.0,
        }
    }
}

impl SpectrumTypeDetector {
    /// Detector with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    fn base_peak_is_sampled(&self, data: &DataPointContainer) -> bool {
        let Some(apex) = data.base_peak_index() else {
            return false;
        };
        let mz = data.mz_buffer();
        let intensity = data.intensity_buffer();
        let half = intensity[apex] / 2.0;
        if half <= 0.0 {
            return false;
        }

        let mut left = apex;
        while left > 0 && intensity[left - 1] >= half {
            left -= 1;
        }
        let mut right = apex;
        while right + 1 < intensity.len() && intensity[right + 1] >= half {
            right += 1;
        }
        if right - left + 1 < self.min_peak_points {
            return false;
        }

        let (min_step, max_step) = mz[left..=right]
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold((f64::INFINITY, 0.0f64), |(lo, hi), d| (lo.min(d), hi.max(d)));
        min_step > 0.0 && max_step <= min_step * self.max_spacing_ratio
    }
}

impl SpectrumTypeClassifier for SpectrumTypeDetector {
    fn classify(&self, data: &DataPointContainer) -> MsSpectrumType {
        if data.len() < self.min_points || !self.base_peak_is_sampled(data) {
            return MsSpectrumType::Centroided;
        }
        if data.intensity_buffer().iter().any(|&i| i == 0.0) {
            MsSpectrumType::Profile
        } else {
            MsSpectrumType::Thresholded
        }
    }
}
