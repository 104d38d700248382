//! Parallel m/z and intensity buffers for a single spectrum
//!
//! [`DataPointContainer`] is the unit exchanged between importers and
//! [`DataPointStore`](crate::store::DataPointStore) backends. The two buffers
//! always have the same length; points keep the order in which they were read
//! from the source, which is not necessarily ascending m/z.

/// Resizable container of (m/z, intensity) pairs.
///
/// The container is designed to be reused: [`clear`](Self::clear) resets the
/// length while keeping the allocated capacity, and
/// [`allocate`](Self::allocate) grows the capacity without touching the
/// existing points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPointContainer {
    mz: Vec<f64>,
    intensity: Vec<f32>,
}

impl DataPointContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container able to hold `capacity` points without reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mz: Vec::with_capacity(capacity),
            intensity: Vec::with_capacity(capacity),
        }
    }

    /// Build a container from two parallel vectors.
    ///
    /// Returns `None` if the vectors differ in length.
    pub fn from_vecs(mz: Vec<f64>, intensity: Vec<f32>) -> Option<Self> {
        if mz.len() != intensity.len() {
            return None;
        }
        Some(Self { mz, intensity })
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Returns true if the container holds no points
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Number of points that fit without reallocating
    pub fn capacity(&self) -> usize {
        self.mz.capacity().min(self.intensity.capacity())
    }

    /// Drop all points, keeping the backing allocation
    pub fn clear(&mut self) {
        self.mz.clear();
        self.intensity.clear();
    }

    /// Ensure capacity for at least `n` points in total. Existing points are kept.
    pub fn allocate(&mut self, n: usize) {
        let additional = n.saturating_sub(self.len());
        self.mz.reserve(additional);
        self.intensity.reserve(additional);
    }

    /// Append one data point
    pub fn push(&mut self, mz: f64, intensity: f32) {
        self.mz.push(mz);
        self.intensity.push(intensity);
    }

    /// Replace the contents with scaled copies of two raw sample slices.
    ///
    /// Every m/z sample is multiplied by `mz_scale`; every intensity sample is
    /// multiplied by `intensity_scale` and then narrowed to 32 bits. The
    /// shorter of the two slices bounds the number of points copied.
    pub fn fill_scaled(&mut self, mz: &[f64], intensity: &[f64], mz_scale: f64, intensity_scale: f64) {
        let n = mz.len().min(intensity.len());
        self.clear();
        self.allocate(n);
        self.mz.extend(mz[..n].iter().map(|&v| v * mz_scale));
        self.intensity
            .extend(intensity[..n].iter().map(|&v| (v * intensity_scale) as f32));
    }

    /// Copy the contents of another container into this one, reusing the allocation
    pub fn copy_from(&mut self, other: &DataPointContainer) {
        self.clear();
        self.allocate(other.len());
        self.mz.extend_from_slice(&other.mz);
        self.intensity.extend_from_slice(&other.intensity);
    }

    /// The m/z buffer
    pub fn mz_buffer(&self) -> &[f64] {
        &self.mz
    }

    /// The intensity buffer
    pub fn intensity_buffer(&self) -> &[f32] {
        &self.intensity
    }

    /// Iterate over (m/z, intensity) pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }

    /// Smallest and largest m/z value, or `None` for an empty container
    pub fn mz_range(&self) -> Option<(f64, f64)> {
        self.mz.iter().fold(None, |acc, &mz| match acc {
            None => Some((mz, mz)),
            Some((lo, hi)) => Some((lo.min(mz), hi.max(mz))),
        })
    }

    /// Sum of all intensities
    pub fn total_ion_current(&self) -> f64 {
        self.intensity.iter().map(|&i| i as f64).sum()
    }

    /// Index of the most intense point
    pub fn base_peak_index(&self) -> Option<usize> {
        self.intensity
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}
