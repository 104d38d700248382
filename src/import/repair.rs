//! Scan index and retention time repair.
//!
//! Some converters write files in which missing scans are marked by a
//! negative `scan_index` entry. Before any scan is emitted the whole table is
//! repaired in one pass:
//!
//! 1. The mean time step between neighbouring good scans is computed once for
//!    the whole file.
//! 2. Each missing scan gets a time extrapolated from its nearest good scan
//!    using that mean step.
//! 3. Each negative offset is replaced by the next non-negative one, so every
//!    missing scan becomes an empty scan at the boundary of the next good one.

use std::fmt;

use log::{error, warn};
use serde::Serialize;

use super::ImportError;

/// Non-fatal problem found while repairing the scan table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RepairWarning {
    /// No good scan exists to anchor this scan's time; the previous scan's
    /// time (or 0 for the first scan) was used instead
    UnanchoredRetentionTime {
        /// 0-based scan index
        scan_index: usize,
        /// Time assigned
        fallback: f32,
    },
}

impl fmt::Display for RepairWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairWarning::UnanchoredRetentionTime {
                scan_index,
                fallback,
            } => write!(
                f,
                "could not fix retention time of scan {}: no good scan in file, using {}",
                scan_index + 1,
                fallback
            ),
        }
    }
}

/// Summary of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    /// Scans with a non-negative index entry
    pub good_scans: usize,
    /// 0-based indices of the scans that were repaired
    pub repaired_scans: Vec<usize>,
    /// Mean time step between neighbouring good scans, if any repair was needed
    pub avg_delta: Option<f64>,
    /// Problems that did not stop the repair
    pub warnings: Vec<RepairWarning>,
}

/// Per-scan start offsets and retention times.
///
/// `start_positions` has one entry per scan plus a closing entry holding the
/// total number of points, so scan `i` spans
/// `start_positions[i]..start_positions[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTable {
    start_positions: Vec<i64>,
    retention_times: Vec<f32>,
}

impl ScanTable {
    /// Build a table from the raw scan index, the total point count and the
    /// per-scan acquisition times.
    pub fn new(
        scan_index: Vec<i64>,
        total_points: usize,
        retention_times: Vec<f32>,
    ) -> Result<Self, ImportError> {
        if retention_times.len() != scan_index.len() {
            return Err(ImportError::TimeArrayLength {
                expected: scan_index.len(),
                found: retention_times.len(),
            });
        }
        let mut start_positions = scan_index;
        start_positions.push(total_points as i64);
        Ok(Self {
            start_positions,
            retention_times,
        })
    }

    /// Number of scans
    pub fn total_scans(&self) -> usize {
        self.retention_times.len()
    }

    /// Offsets including the closing entry
    pub fn start_positions(&self) -> &[i64] {
        &self.start_positions
    }

    /// One time per scan
    pub fn retention_times(&self) -> &[f32] {
        &self.retention_times
    }

    /// Retention time of scan `index` (0-based)
    pub fn retention_time(&self, index: usize) -> Option<f32> {
        self.retention_times.get(index).copied()
    }

    /// Raw `(start, end)` offsets of scan `index` (0-based)
    pub fn scan_range(&self, index: usize) -> Option<(i64, i64)> {
        let start = *self.start_positions.get(index)?;
        let end = *self.start_positions.get(index + 1)?;
        Some((start, end))
    }

    fn is_good(&self, index: usize) -> bool {
        self.start_positions[index] >= 0
    }

    /// Number of scans whose index entry is non-negative
    pub fn good_scans(&self) -> usize {
        (0..self.total_scans()).filter(|&i| self.is_good(i)).count()
    }

    /// Nearest good scan to `index`, looking at +1, -1, +2, -2, ...
    /// Forward wins when both directions are equally far.
    fn nearest_good_scan(&self, index: usize) -> Option<usize> {
        let total = self.total_scans();
        for distance in 1..=total {
            let forward = index + distance;
            if forward < total && self.is_good(forward) {
                return Some(forward);
            }
            if distance <= index && self.is_good(index - distance) {
                return Some(index - distance);
            }
            if forward >= total && distance >= index {
                break;
            }
        }
        None
    }

    /// Mean of `(t[j] - t[i]) / (j - i)` over neighbouring good scans `i < j`
    fn average_time_step(&self) -> f64 {
        let good: Vec<usize> = (0..self.total_scans()).filter(|&i| self.is_good(i)).collect();
        let steps: Vec<f64> = good
            .windows(2)
            .map(|w| {
                let (i, j) = (w[0], w[1]);
                (self.retention_times[j] - self.retention_times[i]) as f64 / (j - i) as f64
            })
            .collect();
        if steps.is_empty() {
            0.0
        } else {
            steps.iter().sum::<f64>() / steps.len() as f64
        }
    }

    /// Fill in missing scans. Does nothing if every scan is present.
    pub fn repair(&mut self) -> RepairReport {
        let total = self.total_scans();
        let mut report = RepairReport {
            good_scans: self.good_scans(),
            ..Default::default()
        };
        if report.good_scans == total {
            return report;
        }
        warn!(
            "{} of {} scans are marked missing; repairing scan index and retention times",
            total - report.good_scans,
            total
        );

        let avg_delta = self.average_time_step();
        report.avg_delta = Some(avg_delta);

        let missing: Vec<usize> = (0..total).filter(|&i| !self.is_good(i)).collect();
        for i in missing {
            report.repaired_scans.push(i);
            match self.nearest_good_scan(i) {
                Some(nearest) => {
                    let time = self.retention_times[nearest] as f64
                        + (i as f64 - nearest as f64) * avg_delta;
                    self.retention_times[i] = time as f32;
                }
                None => {
                    let fallback = if i > 0 { self.retention_times[i - 1] } else { 0.0 };
                    self.retention_times[i] = fallback;
                    error!("Could not fix incorrect scan time of scan {}", i + 1);
                    report.warnings.push(RepairWarning::UnanchoredRetentionTime {
                        scan_index: i,
                        fallback,
                    });
                }
            }
        }

        // Walk backwards so each missing entry copies the next good value.
        let mut next_good = None;
        for i in (0..=total).rev() {
            if self.start_positions[i] >= 0 {
                next_good = Some(self.start_positions[i]);
            } else if let Some(value) = next_good {
                self.start_positions[i] = value;
            }
        }
        report
    }
}
