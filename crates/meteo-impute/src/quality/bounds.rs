//! Bounds validation for observed and estimated values.
//!
//! Two kinds of check:
//! - registry ranges, the physically plausible limits of each sensor type;
//! - IQR fences, `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` derived from a column's
//!   sampled distribution and used to vet interpolated values.

use crate::profiler::sensors::{SensorRegistry, SensorType, ValidRange};
use crate::profiler::statistics::DistributionStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multiplier applied to the IQR when building a fence.
pub const FENCE_MULTIPLIER: f64 = 1.5;

/// Acceptance interval derived from sampled distribution statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fence {
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    /// Build the Tukey fence for a column.
    pub fn from_stats(stats: &DistributionStats) -> Self {
        Self {
            lower: stats.q1 - FENCE_MULTIPLIER * stats.iqr,
            upper: stats.q3 + FENCE_MULTIPLIER * stats.iqr,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.lower && value <= self.upper
    }
}

/// Decides whether a value is acceptable for a sensor type.
#[derive(Debug, Clone)]
pub struct BoundsValidator {
    ranges: BTreeMap<SensorType, ValidRange>,
}

impl Default for BoundsValidator {
    fn default() -> Self {
        Self::new(&SensorRegistry::default())
    }
}

impl BoundsValidator {
    /// Snapshot the effective ranges of a registry.
    pub fn new(registry: &SensorRegistry) -> Self {
        let ranges = SensorType::ALL
            .iter()
            .map(|sensor| (*sensor, registry.range(*sensor)))
            .collect();
        Self { ranges }
    }

    /// Range used for registry-mode checks.
    pub fn range(&self, sensor: SensorType) -> ValidRange {
        self.ranges
            .get(&sensor)
            .copied()
            .unwrap_or_else(|| sensor.spec().range)
    }

    /// Registry-mode check: finite and inside the sensor's range.
    ///
    /// Unbounded types (degree-days, generic) only reject non-finite values.
    pub fn validate(&self, sensor: SensorType, value: f64) -> bool {
        self.range(sensor).contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorOverride;

    fn stats(q1: f64, q3: f64) -> DistributionStats {
        DistributionStats {
            count: 8,
            mean: (q1 + q3) / 2.0,
            median: (q1 + q3) / 2.0,
            min: q1,
            max: q3,
            q1,
            q3,
            iqr: q3 - q1,
        }
    }

    // ==================== registry ranges ====================

    #[test]
    fn test_pressure_range() {
        let validator = BoundsValidator::default();
        assert!(validator.validate(SensorType::Pressure, 1013.0));
        assert!(!validator.validate(SensorType::Pressure, 850.0));
        assert!(!validator.validate(SensorType::Pressure, 1200.0));
    }

    #[test]
    fn test_humidity_range_inclusive() {
        let validator = BoundsValidator::default();
        assert!(validator.validate(SensorType::Humidity, 0.0));
        assert!(validator.validate(SensorType::Humidity, 100.0));
        assert!(!validator.validate(SensorType::Humidity, 100.1));
    }

    #[test]
    fn test_unbounded_types_reject_only_non_finite() {
        let validator = BoundsValidator::default();
        for sensor in [SensorType::DegreeDays, SensorType::Generic] {
            assert!(validator.validate(sensor, -1e9));
            assert!(validator.validate(sensor, 1e9));
            assert!(!validator.validate(sensor, f64::NAN));
            assert!(!validator.validate(sensor, f64::NEG_INFINITY));
        }
    }

    #[test]
    fn test_overridden_range() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            SensorType::WindSpeed,
            SensorOverride {
                min: None,
                max: Some(60.0),
                fallback: None,
            },
        );
        let validator = BoundsValidator::new(&SensorRegistry::with_overrides(&overrides));

        assert!(validator.validate(SensorType::WindSpeed, 59.0));
        assert!(!validator.validate(SensorType::WindSpeed, 120.0));
    }

    // ==================== fences ====================

    #[test]
    fn test_fence_from_stats() {
        let fence = Fence::from_stats(&stats(10.0, 20.0));
        assert_eq!(fence.lower, -5.0);
        assert_eq!(fence.upper, 35.0);
    }

    #[test]
    fn test_fence_contains() {
        let fence = Fence::from_stats(&stats(10.0, 20.0));

        assert!(fence.contains(35.0));
        assert!(!fence.contains(35.01));
        assert!(!fence.contains(f64::NAN));
    }

    #[test]
    fn test_zero_iqr_fence_only_admits_the_quartile() {
        let fence = Fence::from_stats(&stats(10.0, 10.0));
        assert!(fence.contains(10.0));
        assert!(!fence.contains(10.5));
    }
}
