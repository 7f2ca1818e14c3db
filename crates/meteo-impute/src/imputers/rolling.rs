//! Rolling-window estimation.
//!
//! Each column keeps the last K accepted values. Missing cells are replaced
//! by the window median, or by the most recent value for directional sensors.
//! Before any value has been seen the sensor's fallback is used.

use super::{Estimate, EstimateSource, Estimator, FallbackPolicy, Position};
use crate::profiler::sensors::{SensorType, StrategyHint};
use crate::profiler::statistics::median_of;
use crate::quality::BoundsValidator;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fill state of a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    /// Nothing observed yet.
    Bootstrap,
    /// Fewer than K values.
    Warming,
    /// Exactly K values.
    Steady,
}

/// Bounded FIFO of recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create an empty window. A zero capacity is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn phase(&self) -> WindowPhase {
        match self.values.len() {
            0 => WindowPhase::Bootstrap,
            n if n < self.capacity => WindowPhase::Warming,
            _ => WindowPhase::Steady,
        }
    }

    /// Median of the current contents.
    pub fn median(&self) -> Option<f64> {
        let (front, back) = self.values.as_slices();
        if back.is_empty() {
            median_of(front)
        } else {
            median_of(&self.values.iter().copied().collect::<Vec<_>>())
        }
    }

    /// Most recently pushed value.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Contents from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

#[derive(Debug, Clone)]
struct RollingColumn {
    sensor: SensorType,
    window: RollingWindow,
}

/// Causal estimator over per-column rolling windows.
#[derive(Debug, Clone)]
pub struct RollingEstimator {
    columns: Vec<RollingColumn>,
    validator: BoundsValidator,
    fallback: FallbackPolicy,
}

impl RollingEstimator {
    /// One window of `window_size` per column, in schema order.
    pub fn new(
        sensors: &[SensorType],
        window_size: usize,
        validator: BoundsValidator,
        fallback: FallbackPolicy,
    ) -> Self {
        let columns = sensors
            .iter()
            .map(|&sensor| RollingColumn {
                sensor,
                window: RollingWindow::new(window_size),
            })
            .collect();
        Self {
            columns,
            validator,
            fallback,
        }
    }

    pub fn window(&self, column: usize) -> Option<&RollingWindow> {
        self.columns.get(column).map(|c| &c.window)
    }

    pub fn phase(&self, column: usize) -> Option<WindowPhase> {
        self.window(column).map(RollingWindow::phase)
    }
}

impl Estimator for RollingEstimator {
    fn observe(&mut self, column: usize, _position: usize, value: f64) {
        if let Some(state) = self.columns.get_mut(column) {
            debug_assert!(self.validator.validate(state.sensor, value));
            state.window.push(value);
        }
    }

    fn estimate(&self, column: usize, position: Position) -> Estimate {
        let Some(state) = self.columns.get(column) else {
            return Estimate::new(
                self.fallback.value(SensorType::Generic, position),
                EstimateSource::Fallback,
            );
        };

        let candidate = match state.sensor.spec().strategy {
            StrategyHint::Persist => state
                .window
                .latest()
                .map(|v| Estimate::new(v, EstimateSource::Persisted)),
            StrategyHint::Rolling => state
                .window
                .median()
                .map(|v| Estimate::new(v, EstimateSource::Window)),
        };

        match candidate {
            Some(estimate) if self.validator.validate(state.sensor, estimate.value) => estimate,
            _ => Estimate::new(
                self.fallback.value(state.sensor, position),
                EstimateSource::Fallback,
            ),
        }
    }
}
