//! Distribution sampling for numeric columns.
//!
//! Statistics are computed from a capped prefix of rows. Quartiles use the
//! nearest-rank positions `n/4` and `3n/4` of the sorted sample; the median
//! averages the middle pair for even counts.

use crate::cleaner::CellState;
use serde::{Deserialize, Serialize};

/// Summary statistics of a column's sampled valid values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
}

impl DistributionStats {
    /// Compute statistics from unsorted values. Returns `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = sorted_median(&sorted);
        let q1 = sorted[n / 4];
        let q3 = sorted[(3 * n / 4).min(n - 1)];

        Some(Self {
            count: n,
            mean,
            median,
            min: sorted[0],
            max: sorted[n - 1],
            q1,
            q3,
            iqr: q3 - q1,
        })
    }
}

/// Classical median (middle pair averaged for even counts).
pub fn median_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted_median(&sorted))
}

fn sorted_median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Cell counts observed while sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCounts {
    /// Rows sampled.
    pub rows: usize,
    /// Numeric cells that were accepted into the sample.
    pub accepted: usize,
    /// Numeric cells rejected by validation (out of range or non-finite).
    pub rejected: usize,
    /// Non-numeric, non-missing cells.
    pub text: usize,
    /// Missing cells.
    pub missing: usize,
}

impl SampleCounts {
    /// Share of non-missing cells that parsed as numbers.
    ///
    /// A column with no non-missing cells counts as fully numeric.
    pub fn numeric_ratio(&self) -> f64 {
        let numeric = self.accepted + self.rejected;
        let present = numeric + self.text;
        if present == 0 {
            1.0
        } else {
            numeric as f64 / present as f64
        }
    }

    /// Share of sampled rows whose cell was missing.
    pub fn missing_ratio(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.missing as f64 / self.rows as f64
        }
    }
}

/// Result of sampling one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSample {
    pub counts: SampleCounts,
    /// `None` when no valid value was sampled.
    pub stats: Option<DistributionStats>,
}

/// Collects a bounded prefix sample for one column.
#[derive(Debug, Clone)]
pub struct DistributionSampler {
    cap: usize,
    values: Vec<f64>,
    counts: SampleCounts,
}

impl DistributionSampler {
    /// Create a sampler that considers at most `cap` rows.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            values: Vec::with_capacity(cap.min(4096)),
            counts: SampleCounts::default(),
        }
    }

    /// Whether the row cap has been reached.
    pub fn is_full(&self) -> bool {
        self.counts.rows >= self.cap
    }

    /// Record a valid value.
    pub fn record_value(&mut self, value: f64) {
        if self.begin_row() {
            self.counts.accepted += 1;
            self.values.push(value);
        }
    }

    /// Record a numeric cell that failed validation.
    pub fn record_rejected(&mut self) {
        if self.begin_row() {
            self.counts.rejected += 1;
        }
    }

    /// Record a non-numeric cell.
    pub fn record_text(&mut self) {
        if self.begin_row() {
            self.counts.text += 1;
        }
    }

    /// Record a missing cell.
    pub fn record_missing(&mut self) {
        if self.begin_row() {
            self.counts.missing += 1;
        }
    }

    /// Record a parsed cell. Numbers are only checked for finiteness here;
    /// range checks belong to the caller.
    pub fn observe(&mut self, cell: &CellState<'_>) {
        match cell {
            CellState::Missing => self.record_missing(),
            CellState::Text(_) => self.record_text(),
            CellState::Numeric(v) if v.is_finite() => self.record_value(*v),
            CellState::Numeric(_) => self.record_rejected(),
        }
    }

    pub fn finish(self) -> ColumnSample {
        ColumnSample {
            counts: self.counts,
            stats: DistributionStats::from_values(&self.values),
        }
    }

    fn begin_row(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.counts.rows += 1;
        true
    }
}
