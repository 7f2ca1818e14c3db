//! Column profiling.
//!
//! This module provides functionality for profiling station columns, including:
//! - Sensor type classification from header text
//! - Distribution statistics over a bounded prefix sample
//! - Column kind decisions (numeric, datetime, pass-through text)

pub mod classifier;
pub mod sensors;
pub mod statistics;

use crate::cleaner::{CellDetector, CellState};
use crate::quality::BoundsValidator;
use crate::types::{Row, Schema};
use classifier::ColumnClassifier;
use sensors::SensorType;
use serde::{Deserialize, Serialize};
use statistics::{ColumnSample, DistributionSampler, SampleCounts};
use tracing::debug;

/// How the engine treats a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Imputed with the configured estimator.
    Numeric,
    /// Passed through; missing cells get the datetime sentinel.
    Datetime,
    /// Passed through unchanged.
    Text,
}

impl ColumnKind {
    /// Decide a column's kind from its sensor type and sampled counts.
    ///
    /// Without a sample every non-datetime column is numeric.
    pub fn decide(sensor: SensorType, counts: Option<&SampleCounts>, min_numeric_ratio: f64) -> Self {
        if !sensor.is_numeric() {
            return Self::Datetime;
        }
        match counts {
            Some(counts) if counts.numeric_ratio() < min_numeric_ratio => Self::Text,
            _ => Self::Numeric,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Datetime => "datetime",
            Self::Text => "text",
        }
    }
}

/// Classification and sample of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub sensor: SensorType,
    pub kind: ColumnKind,
    /// `None` when the column was never sampled (datetime columns, streaming runs).
    pub sample: Option<ColumnSample>,
}

impl ColumnProfile {
    /// Profile without a sample pass.
    pub fn unsampled(name: impl Into<String>, sensor: SensorType) -> Self {
        Self {
            name: name.into(),
            sensor,
            kind: ColumnKind::decide(sensor, None, 0.0),
            sample: None,
        }
    }
}

/// Column profiler for station records.
pub struct DataProfiler;

impl DataProfiler {
    /// Classify every column of a schema without looking at any cells.
    pub fn classify_columns(schema: &Schema) -> Vec<ColumnProfile> {
        let mut classifier = ColumnClassifier::new();
        schema
            .headers()
            .iter()
            .map(|header| ColumnProfile::unsampled(header.clone(), classifier.classify(header)))
            .collect()
    }

    /// Profile every column over the first `sample_rows` rows.
    ///
    /// Rows must already have been checked against `schema`. Numeric cells
    /// are sampled only when they pass the registry range for the column's
    /// sensor type.
    pub fn profile_columns(
        schema: &Schema,
        rows: &[Row],
        sample_rows: usize,
        min_numeric_ratio: f64,
        detector: &CellDetector,
        validator: &BoundsValidator,
    ) -> Vec<ColumnProfile> {
        let mut profiles = Self::classify_columns(schema);
        let mut samplers: Vec<Option<DistributionSampler>> = profiles
            .iter()
            .map(|p| p.sensor.is_numeric().then(|| DistributionSampler::new(sample_rows)))
            .collect();

        for row in rows.iter().take(sample_rows) {
            for (slot, (header, raw)) in row.iter().enumerate() {
                let Some(column) = schema.column_of(slot, header) else {
                    continue;
                };
                let Some(sampler) = samplers[column].as_mut() else {
                    continue;
                };

                match detector.parse(raw) {
                    CellState::Numeric(value) if !validator.validate(profiles[column].sensor, value) => {
                        sampler.record_rejected()
                    }
                    cell => sampler.observe(&cell),
                }
            }
        }

        for (profile, sampler) in profiles.iter_mut().zip(samplers) {
            let Some(sampler) = sampler else {
                continue;
            };
            let sample = sampler.finish();
            profile.kind = ColumnKind::decide(profile.sensor, Some(&sample.counts), min_numeric_ratio);

            debug!(
                "  {}: {} ({}, {:.1}% numeric, {:.1}% missing)",
                profile.name,
                profile.sensor,
                profile.kind.as_str(),
                sample.counts.numeric_ratio() * 100.0,
                sample.counts.missing_ratio() * 100.0
            );
            profile.sample = Some(sample);
        }

        profiles
    }
}
