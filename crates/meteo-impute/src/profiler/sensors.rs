//! Sensor type registry.
//!
//! Static table describing every sensor type the engine knows about: the
//! keywords that identify its columns, the physically plausible value range,
//! the estimate rule and the fallback constant used when no history exists.
//!
//! Classification order lives in [`CLASSIFICATION_RULES`] as plain data so the
//! specific-before-generic ordering can be audited and tested on its own.

use crate::config::SensorOverride;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorType {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
    Precipitation,
    Solar,
    Uv,
    AirQuality,
    Particulate,
    DegreeDays,
    Datetime,
    Generic,
}

impl SensorType {
    /// Every sensor type, in registry order.
    pub const ALL: [SensorType; 13] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::Pressure,
        SensorType::WindSpeed,
        SensorType::WindDirection,
        SensorType::Precipitation,
        SensorType::Solar,
        SensorType::Uv,
        SensorType::AirQuality,
        SensorType::Particulate,
        SensorType::DegreeDays,
        SensorType::Datetime,
        SensorType::Generic,
    ];

    /// Stable identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::WindSpeed => "wind-speed",
            Self::WindDirection => "wind-direction",
            Self::Precipitation => "precipitation",
            Self::Solar => "solar",
            Self::Uv => "uv",
            Self::AirQuality => "air-quality",
            Self::Particulate => "particulate",
            Self::DegreeDays => "degree-days",
            Self::Datetime => "datetime",
            Self::Generic => "generic",
        }
    }

    /// Static registry entry for this type.
    pub fn spec(&self) -> &'static SensorSpec {
        // SENSOR_SPECS is laid out in `ALL` order.
        &SENSOR_SPECS[*self as usize]
    }

    /// Datetime columns are never imputed numerically.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Datetime)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the rolling estimator derives a value from a column's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyHint {
    /// Median of the recent window.
    Rolling,
    /// Most recently observed value.
    Persist,
}

/// Inclusive numeric range; `None` leaves that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValidRange {
    /// Range bounded on both sides.
    pub const fn bounded(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Range with no bounds (values still have to be finite).
    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Check that a value is finite and inside the range.
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Registry entry for a sensor type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSpec {
    pub sensor: SensorType,
    pub range: ValidRange,
    pub strategy: StrategyHint,
    pub fallback: f64,
    /// Temperature-like quantities get a time-of-day offset on the fallback path.
    pub diurnal: bool,
}

static SENSOR_SPECS: [SensorSpec; 13] = [
    SensorSpec {
        sensor: SensorType::Temperature,
        range: ValidRange::bounded(-60.0, 60.0),
        strategy: StrategyHint::Rolling,
        fallback: 20.0,
        diurnal: true,
    },
    SensorSpec {
        sensor: SensorType::Humidity,
        range: ValidRange::bounded(0.0, 100.0),
        strategy: StrategyHint::Rolling,
        fallback: 60.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Pressure,
        range: ValidRange::bounded(900.0, 1100.0),
        strategy: StrategyHint::Rolling,
        fallback: 1013.25,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::WindSpeed,
        range: ValidRange::bounded(0.0, 200.0),
        strategy: StrategyHint::Rolling,
        fallback: 0.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::WindDirection,
        range: ValidRange::bounded(0.0, 360.0),
        strategy: StrategyHint::Persist,
        fallback: 180.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Precipitation,
        range: ValidRange::bounded(0.0, 500.0),
        strategy: StrategyHint::Rolling,
        fallback: 0.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Solar,
        range: ValidRange::bounded(0.0, 1500.0),
        strategy: StrategyHint::Rolling,
        fallback: 0.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Uv,
        range: ValidRange::bounded(0.0, 20.0),
        strategy: StrategyHint::Rolling,
        fallback: 0.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::AirQuality,
        range: ValidRange::bounded(0.0, 500.0),
        strategy: StrategyHint::Rolling,
        fallback: 50.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Particulate,
        range: ValidRange::bounded(0.0, 1000.0),
        strategy: StrategyHint::Rolling,
        fallback: 12.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::DegreeDays,
        range: ValidRange::unbounded(),
        strategy: StrategyHint::Rolling,
        fallback: 0.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Datetime,
        range: ValidRange::unbounded(),
        strategy: StrategyHint::Persist,
        fallback: 0.0,
        diurnal: false,
    },
    SensorSpec {
        sensor: SensorType::Generic,
        range: ValidRange::unbounded(),
        strategy: StrategyHint::Rolling,
        fallback: 0.0,
        diurnal: false,
    },
];

/// One entry of the ordered classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    /// Lower-case keywords, any of which selects `sensor` when found in a header.
    pub keywords: &'static [&'static str],
    pub sensor: SensorType,
}

/// Classification rules in evaluation order; the first matching rule wins.
///
/// Multi-word rules come first, then single-keyword rules, then the datetime
/// check. Anything left over is [`SensorType::Generic`].
pub static CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        keywords: &["heat index", "wind chill", "dew point", "thw index", "thsw index"],
        sensor: SensorType::Temperature,
    },
    ClassificationRule {
        keywords: &["wind direction", "wind dir", "prevailing"],
        sensor: SensorType::WindDirection,
    },
    ClassificationRule {
        keywords: &["wind speed", "wind run", "gust", "wind"],
        sensor: SensorType::WindSpeed,
    },
    ClassificationRule {
        keywords: &["degree day", "heat d d", "cool d d", "hdd", "cdd"],
        sensor: SensorType::DegreeDays,
    },
    ClassificationRule {
        keywords: &["air quality", "aqi"],
        sensor: SensorType::AirQuality,
    },
    ClassificationRule {
        keywords: &["solar", "radiation"],
        sensor: SensorType::Solar,
    },
    ClassificationRule {
        keywords: &["rain", "precip"],
        sensor: SensorType::Precipitation,
    },
    ClassificationRule {
        keywords: &["pressure", "bar"],
        sensor: SensorType::Pressure,
    },
    ClassificationRule {
        keywords: &["temp"],
        sensor: SensorType::Temperature,
    },
    ClassificationRule {
        keywords: &["hum"],
        sensor: SensorType::Humidity,
    },
    ClassificationRule {
        keywords: &["pm"],
        sensor: SensorType::Particulate,
    },
    ClassificationRule {
        keywords: &["uv"],
        sensor: SensorType::Uv,
    },
    ClassificationRule {
        keywords: &["date", "time"],
        sensor: SensorType::Datetime,
    },
];

/// Registry with per-deployment overrides applied on top of the static table.
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    ranges: BTreeMap<SensorType, ValidRange>,
    fallbacks: BTreeMap<SensorType, f64>,
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::with_overrides(&BTreeMap::new())
    }
}

impl SensorRegistry {
    /// Build a registry, replacing static values with any configured override.
    pub fn with_overrides(overrides: &BTreeMap<SensorType, SensorOverride>) -> Self {
        let mut ranges = BTreeMap::new();
        let mut fallbacks = BTreeMap::new();

        for sensor in SensorType::ALL {
            let spec = sensor.spec();
            let mut range = spec.range;
            let mut fallback = spec.fallback;

            if let Some(ov) = overrides.get(&sensor) {
                if ov.min.is_some() {
                    range.min = ov.min;
                }
                if ov.max.is_some() {
                    range.max = ov.max;
                }
                if let Some(value) = ov.fallback {
                    fallback = value;
                }
            }

            ranges.insert(sensor, range);
            fallbacks.insert(sensor, fallback);
        }

        Self { ranges, fallbacks }
    }

    /// Effective valid range for a sensor type.
    pub fn range(&self, sensor: SensorType) -> ValidRange {
        self.ranges
            .get(&sensor)
            .copied()
            .unwrap_or_else(|| sensor.spec().range)
    }

    /// Effective base fallback value for a sensor type.
    pub fn fallback(&self, sensor: SensorType) -> f64 {
        self.fallbacks
            .get(&sensor)
            .copied()
            .unwrap_or(sensor.spec().fallback)
    }
}
