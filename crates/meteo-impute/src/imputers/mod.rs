//! Estimators for missing sensor readings.
//!
//! This module provides two interchangeable strategies behind the
//! [`Estimator`] trait:
//! - Rolling-window estimation (causal, bounded memory)
//! - Linear interpolation between valid anchors (two-pass, whole series)

pub mod diurnal;
pub mod interpolation;
pub mod rolling;

pub use diurnal::{DiurnalClock, hour_from_timestamp};
pub use interpolation::{AnchorSet, InterpolationEstimator, InterpolationStats, interpolate};
pub use rolling::{RollingEstimator, RollingWindow, WindowPhase};

use crate::profiler::sensors::{SensorRegistry, SensorType};
use crate::quality::BoundsValidator;
use serde::{Deserialize, Serialize};

/// Where an estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Median of the rolling window.
    Window,
    /// Most recent observed value.
    Persisted,
    /// Linear interpolation between two anchors.
    Interpolated,
    /// A single anchor's value (edge run or fence rejection).
    NearestAnchor,
    /// The sensor type's fallback constant.
    Fallback,
}

impl EstimateSource {
    /// Whether the estimate counts towards the fallback tally.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::NearestAnchor | Self::Fallback)
    }
}

/// A replacement value and its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub source: EstimateSource,
}

impl Estimate {
    pub fn new(value: f64, source: EstimateSource) -> Self {
        Self { value, source }
    }
}

/// Row position of a cell being estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 0-based row index in the run.
    pub index: usize,
    /// Hour of day taken from the row's timestamp, when known.
    pub hour: Option<u32>,
}

impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Self { index, hour: None }
    }
}

/// Shared estimator interface.
///
/// Columns are addressed by their index in the run's schema. Callers only
/// pass values that already passed the bounds validator to `observe`, and
/// only consult `estimate` for cells that need a replacement.
pub trait Estimator {
    /// Record a valid observation.
    fn observe(&mut self, column: usize, position: usize, value: f64);

    /// Estimate a replacement for a missing or rejected cell.
    fn estimate(&self, column: usize, position: Position) -> Estimate;
}

/// Fallback values per sensor type, with the diurnal offset for
/// temperature-like types.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    registry: SensorRegistry,
    validator: BoundsValidator,
    clock: DiurnalClock,
}

impl FallbackPolicy {
    pub fn new(registry: SensorRegistry, clock: DiurnalClock) -> Self {
        let validator = BoundsValidator::new(&registry);
        Self {
            registry,
            validator,
            clock,
        }
    }

    /// Base fallback with no time-of-day adjustment.
    pub fn base(&self, sensor: SensorType) -> f64 {
        self.registry.fallback(sensor)
    }

    /// Fallback for a sensor at a row.
    ///
    /// An adjusted value outside the sensor's range reverts to the base.
    pub fn value(&self, sensor: SensorType, position: Position) -> f64 {
        let base = self.base(sensor);
        if !sensor.spec().diurnal {
            return base;
        }

        let hour = position
            .hour
            .unwrap_or_else(|| self.clock.hour_of(position.index));
        let adjusted = base + diurnal::diurnal_offset(hour);
        if self.validator.validate(sensor, adjusted) {
            adjusted
        } else {
            base
        }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(SensorRegistry::default(), DiurnalClock::new(5))
    }
}
