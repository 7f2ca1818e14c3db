//! Configuration types for the imputation engine.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic engine setup.

use crate::cleaner::{DEFAULT_MISSING_TOKENS, EXTENDED_MISSING_TOKENS};
use crate::error::Result;
use crate::profiler::sensors::SensorType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Estimator used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImputationStrategy {
    /// Causal rolling-window median (most recent value for directional sensors).
    #[default]
    Rolling,
    /// Global linear interpolation between the nearest valid neighbours.
    Interpolation,
}

impl ImputationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rolling => "rolling",
            Self::Interpolation => "interpolation",
        }
    }
}

/// Per-deployment replacement for a sensor type's range and fallback.
///
/// Unset fields keep the built-in value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorOverride {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub fallback: Option<f64>,
}

/// Configuration for the imputation engine.
///
/// Use [`ImputationConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use meteo_impute::config::{ImputationConfig, ImputationStrategy};
///
/// let config = ImputationConfig::builder()
///     .strategy(ImputationStrategy::Interpolation)
///     .window_size(24)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Estimator used for every numeric column.
    /// Default: Rolling
    pub strategy: ImputationStrategy,

    /// Number of recent valid values kept per column in rolling mode.
    /// Default: 12
    pub window_size: usize,

    /// Minutes between consecutive rows, used to estimate the hour of day.
    /// Default: 5
    pub sample_interval_minutes: u32,

    /// Number of leading rows used for distribution statistics.
    /// Default: 30000
    pub sample_rows: usize,

    /// Case-insensitive cell values treated as missing.
    /// Default: "-", "--", "nan", "none", "null"
    pub missing_tokens: Vec<String>,

    /// Minimum share of numeric cells for a column to be imputed (0.0 - 1.0).
    /// Columns below this share are passed through as text.
    /// Default: 0.1
    pub min_numeric_ratio: f64,

    /// Decimal places used when writing imputed values.
    /// Default: 3
    pub output_precision: usize,

    /// Literal written into a missing datetime cell.
    /// Default: "MISSING"
    pub datetime_sentinel: String,

    /// Derive the hour of day from the row's datetime cell when it parses.
    /// Default: false
    pub timestamp_hours: bool,

    /// Range and fallback overrides per sensor type.
    /// Default: empty
    pub overrides: BTreeMap<SensorType, SensorOverride>,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            strategy: ImputationStrategy::default(),
            window_size: 12,
            sample_interval_minutes: 5,
            sample_rows: 30_000,
            missing_tokens: DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()).collect(),
            min_numeric_ratio: 0.1,
            output_precision: 3,
            datetime_sentinel: "MISSING".to_string(),
            timestamp_hours: false,
            overrides: BTreeMap::new(),
        }
    }
}

impl ImputationConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ImputationConfigBuilder {
        ImputationConfigBuilder::default()
    }

    /// Default missing markers plus the wider set found in spreadsheet exports.
    pub fn extended_missing_tokens() -> Vec<String> {
        DEFAULT_MISSING_TOKENS
            .iter()
            .chain(EXTENDED_MISSING_TOKENS.iter())
            .map(|t| t.to_string())
            .collect()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::error::ImputationError::Io(e)
                .with_context(format!("Failed to read config {}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.window_size == 0 {
            return Err(ConfigValidationError::InvalidWindowSize(self.window_size));
        }

        if self.sample_interval_minutes == 0 {
            return Err(ConfigValidationError::InvalidSampleInterval(
                self.sample_interval_minutes,
            ));
        }

        if self.sample_rows == 0 {
            return Err(ConfigValidationError::InvalidSampleRows(self.sample_rows));
        }

        if !(0.0..=1.0).contains(&self.min_numeric_ratio) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "min_numeric_ratio".to_string(),
                value: self.min_numeric_ratio,
            });
        }

        if self.output_precision > 12 {
            return Err(ConfigValidationError::InvalidPrecision(self.output_precision));
        }

        let sentinel = self.datetime_sentinel.trim();
        if sentinel.is_empty()
            || self
                .missing_tokens
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case(sentinel))
        {
            return Err(ConfigValidationError::InvalidSentinel(
                self.datetime_sentinel.clone(),
            ));
        }

        for (sensor, ov) in &self.overrides {
            validate_override(*sensor, ov)?;
        }

        Ok(())
    }
}

fn validate_override(
    sensor: SensorType,
    ov: &SensorOverride,
) -> std::result::Result<(), ConfigValidationError> {
    let invalid = |reason: &str| ConfigValidationError::InvalidOverride {
        sensor,
        reason: reason.to_string(),
    };

    for value in [ov.min, ov.max, ov.fallback].into_iter().flatten() {
        if !value.is_finite() {
            return Err(invalid("values must be finite"));
        }
    }

    let base = sensor.spec();
    let min = ov.min.or(base.range.min);
    let max = ov.max.or(base.range.max);

    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(invalid("min is greater than max"));
    }

    let fallback = ov.fallback.unwrap_or(base.fallback);
    if min.is_some_and(|min| fallback < min) || max.is_some_and(|max| fallback > max) {
        return Err(invalid("fallback lies outside the valid range"));
    }

    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid window size: {0} (must be at least 1)")]
    InvalidWindowSize(usize),

    #[error("Invalid sample interval: {0} minutes (must be at least 1)")]
    InvalidSampleInterval(u32),

    #[error("Invalid sample row cap: {0} (must be at least 1)")]
    InvalidSampleRows(usize),

    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid output precision: {0} (must be at most 12)")]
    InvalidPrecision(usize),

    #[error("Invalid datetime sentinel '{0}' (must be non-empty and not a missing token)")]
    InvalidSentinel(String),

    #[error("Invalid override for {sensor}: {reason}")]
    InvalidOverride { sensor: SensorType, reason: String },
}

/// Builder for [`ImputationConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ImputationConfigBuilder {
    strategy: Option<ImputationStrategy>,
    window_size: Option<usize>,
    sample_interval_minutes: Option<u32>,
    sample_rows: Option<usize>,
    missing_tokens: Option<Vec<String>>,
    min_numeric_ratio: Option<f64>,
    output_precision: Option<usize>,
    datetime_sentinel: Option<String>,
    timestamp_hours: Option<bool>,
    overrides: BTreeMap<SensorType, SensorOverride>,
}

impl ImputationConfigBuilder {
    /// Set the estimator strategy.
    pub fn strategy(mut self, strategy: ImputationStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the rolling window size.
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = Some(size);
        self
    }

    /// Set the row cadence in minutes.
    pub fn sample_interval_minutes(mut self, minutes: u32) -> Self {
        self.sample_interval_minutes = Some(minutes);
        self
    }

    /// Set the number of rows sampled for distribution statistics.
    pub fn sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = Some(rows);
        self
    }

    /// Replace the missing-marker set.
    pub fn missing_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Set the minimum numeric share for a column to be imputed.
    ///
    /// # Arguments
    /// * `ratio` - Value between 0.0 and 1.0 (e.g., 0.1 = 10%)
    pub fn min_numeric_ratio(mut self, ratio: f64) -> Self {
        self.min_numeric_ratio = Some(ratio);
        self
    }

    /// Set the decimal places used for imputed values.
    pub fn output_precision(mut self, precision: usize) -> Self {
        self.output_precision = Some(precision);
        self
    }

    /// Set the literal written into missing datetime cells.
    pub fn datetime_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.datetime_sentinel = Some(sentinel.into());
        self
    }

    /// Enable or disable timestamp-derived hours for the diurnal fallback.
    pub fn timestamp_hours(mut self, enable: bool) -> Self {
        self.timestamp_hours = Some(enable);
        self
    }

    /// Override the range and fallback of one sensor type.
    pub fn sensor_override(mut self, sensor: SensorType, ov: SensorOverride) -> Self {
        self.overrides.insert(sensor, ov);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ImputationConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<ImputationConfig, ConfigValidationError> {
        let defaults = ImputationConfig::default();
        let config = ImputationConfig {
            strategy: self.strategy.unwrap_or_default(),
            window_size: self.window_size.unwrap_or(defaults.window_size),
            sample_interval_minutes: self
                .sample_interval_minutes
                .unwrap_or(defaults.sample_interval_minutes),
            sample_rows: self.sample_rows.unwrap_or(defaults.sample_rows),
            missing_tokens: self.missing_tokens.unwrap_or(defaults.missing_tokens),
            min_numeric_ratio: self.min_numeric_ratio.unwrap_or(defaults.min_numeric_ratio),
            output_precision: self.output_precision.unwrap_or(defaults.output_precision),
            datetime_sentinel: self.datetime_sentinel.unwrap_or(defaults.datetime_sentinel),
            timestamp_hours: self.timestamp_hours.unwrap_or(defaults.timestamp_hours),
            overrides: self.overrides,
        };

        config.validate()?;
        Ok(config)
    }
}
