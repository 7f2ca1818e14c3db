//! Linear interpolation between valid anchors.
//!
//! Pass 1 collects every valid `(position, value)` pair per column into an
//! [`AnchorSet`]. Pass 2 estimates each missing position from the nearest
//! anchors on either side, found by binary search:
//!
//! - interior gaps get a linear ramp between the two anchors;
//! - leading and trailing runs copy the single neighbouring anchor;
//! - a column with no anchors uses the sensor fallback.
//!
//! Interpolated values outside the column's IQR fence are replaced by the
//! nearer anchor (the left one on a tie).

use super::{Estimate, EstimateSource, Estimator, FallbackPolicy, Position};
use crate::profiler::sensors::SensorType;
use crate::quality::Fence;
use serde::{Deserialize, Serialize};

/// Valid observations of one column, ordered by position.
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    positions: Vec<usize>,
    values: Vec<f64>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an anchor. Positions must be strictly increasing; an anchor at
    /// or before the last position is ignored.
    pub fn push(&mut self, position: usize, value: f64) -> bool {
        if self.positions.last().is_some_and(|&last| position <= last) {
            return false;
        }
        self.positions.push(position);
        self.values.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Nearest anchors strictly before and strictly after `position`.
    pub fn neighbors(&self, position: usize) -> (Option<(usize, f64)>, Option<(usize, f64)>) {
        let split = self.positions.partition_point(|&p| p < position);
        let left = split
            .checked_sub(1)
            .map(|i| (self.positions[i], self.values[i]));

        let right_index = if self.positions.get(split) == Some(&position) {
            split + 1
        } else {
            split
        };
        let right = self
            .positions
            .get(right_index)
            .map(|&p| (p, self.values[right_index]));

        (left, right)
    }

    /// Estimate at a position, or `None` when there are no anchors.
    pub fn estimate_at(&self, position: usize, fence: Option<&Fence>) -> Option<Estimate> {
        match self.neighbors(position) {
            (Some((x1, y1)), Some((x2, y2))) => {
                let t = (position - x1) as f64 / (x2 - x1) as f64;
                let y = y1 + t * (y2 - y1);

                if fence.is_none_or(|f| f.contains(y)) {
                    Some(Estimate::new(y, EstimateSource::Interpolated))
                } else {
                    let nearer = if position - x1 <= x2 - position { y1 } else { y2 };
                    Some(Estimate::new(nearer, EstimateSource::NearestAnchor))
                }
            }
            (None, Some((_, y))) | (Some((_, y)), None) => {
                Some(Estimate::new(y, EstimateSource::NearestAnchor))
            }
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct InterpolationColumn {
    sensor: SensorType,
    anchors: AnchorSet,
    fence: Option<Fence>,
}

/// Two-pass estimator over per-column anchor sets.
#[derive(Debug, Clone)]
pub struct InterpolationEstimator {
    columns: Vec<InterpolationColumn>,
    fallback: FallbackPolicy,
}

impl InterpolationEstimator {
    /// Empty anchor sets, one per column in schema order.
    pub fn new(sensors: &[SensorType], fallback: FallbackPolicy) -> Self {
        let columns = sensors
            .iter()
            .map(|&sensor| InterpolationColumn {
                sensor,
                anchors: AnchorSet::new(),
                fence: None,
            })
            .collect();
        Self { columns, fallback }
    }

    /// Set the acceptance fence for a column's interpolated values.
    pub fn set_fence(&mut self, column: usize, fence: Option<Fence>) {
        if let Some(state) = self.columns.get_mut(column) {
            state.fence = fence;
        }
    }

    pub fn anchors(&self, column: usize) -> Option<&AnchorSet> {
        self.columns.get(column).map(|c| &c.anchors)
    }
}

impl Estimator for InterpolationEstimator {
    fn observe(&mut self, column: usize, position: usize, value: f64) {
        if let Some(state) = self.columns.get_mut(column) {
            state.anchors.push(position, value);
        }
    }

    fn estimate(&self, column: usize, position: Position) -> Estimate {
        let Some(state) = self.columns.get(column) else {
            return Estimate::new(
                self.fallback.value(SensorType::Generic, position),
                EstimateSource::Fallback,
            );
        };

        state
            .anchors
            .estimate_at(position.index, state.fence.as_ref())
            .unwrap_or_else(|| {
                Estimate::new(
                    self.fallback.value(state.sensor, position),
                    EstimateSource::Fallback,
                )
            })
    }
}

/// Counts from filling one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationStats {
    pub interpolated: usize,
    pub fallback: usize,
}

/// Fill the `None` positions of a single series.
///
/// `fallback` is used for every position when the series has no values.
pub fn interpolate(
    values: &[Option<f64>],
    fallback: f64,
    fence: Option<Fence>,
) -> (Vec<f64>, InterpolationStats) {
    let mut anchors = AnchorSet::new();
    for (position, value) in values.iter().enumerate() {
        if let Some(v) = value {
            anchors.push(position, *v);
        }
    }

    let mut stats = InterpolationStats::default();
    let filled = values
        .iter()
        .enumerate()
        .map(|(position, value)| match value {
            Some(v) => *v,
            None => match anchors.estimate_at(position, fence.as_ref()) {
                Some(estimate) => {
                    if estimate.source.is_fallback() {
                        stats.fallback += 1;
                    } else {
                        stats.interpolated += 1;
                    }
                    estimate.value
                }
                None => {
                    stats.fallback += 1;
                    fallback
                }
            },
        })
        .collect();

    (filled, stats)
}
