//! Row-level execution of an imputation run.
//!
//! The executor owns the run's schema, column profiles and counters. It is
//! strategy-agnostic: callers hand it an [`Estimator`] and the executor
//! decides, cell by cell, whether to keep the observed value or ask for an
//! estimate.

use crate::cleaner::{CellDetector, CellState, format_value};
use crate::config::{ImputationConfig, ImputationStrategy};
use crate::error::{ImputationError, Result};
use crate::imputers::{Estimator, Position, hour_from_timestamp};
use crate::profiler::sensors::SensorType;
use crate::profiler::{ColumnKind, ColumnProfile};
use crate::quality::BoundsValidator;
use crate::types::{ColumnSummary, Row, RunSummary, Schema};
use tracing::{debug, info, warn};

/// Executes imputation over rows for a fixed schema.
#[derive(Debug, Clone)]
pub struct ImputationExecutor {
    schema: Schema,
    profiles: Vec<ColumnProfile>,
    detector: CellDetector,
    validator: BoundsValidator,
    precision: usize,
    sentinel: String,
    timestamp_column: Option<usize>,
    /// Columns whose kind is decided by their first present cell.
    provisional: Vec<bool>,
    summaries: Vec<ColumnSummary>,
    rows_processed: usize,
}

impl ImputationExecutor {
    /// Create an executor. `profiles` must be in schema order.
    pub fn new(
        schema: Schema,
        profiles: Vec<ColumnProfile>,
        config: &ImputationConfig,
        detector: CellDetector,
        validator: BoundsValidator,
    ) -> Self {
        let timestamp_column = if config.timestamp_hours {
            profiles.iter().position(|p| p.kind == ColumnKind::Datetime)
        } else {
            None
        };
        let summaries = profiles.iter().map(ColumnSummary::new).collect();
        let provisional = vec![false; profiles.len()];

        Self {
            schema,
            profiles,
            detector,
            validator,
            precision: config.output_precision,
            sentinel: config.datetime_sentinel.clone(),
            timestamp_column,
            provisional,
            summaries,
            rows_processed: 0,
        }
    }

    /// Let unsampled numeric columns settle their kind on the first present
    /// cell: a text cell turns the column into a pass-through text column.
    ///
    /// Used by streaming sessions, which have no sampling pass.
    pub fn with_provisional_kinds(mut self) -> Self {
        self.provisional = self
            .profiles
            .iter()
            .map(|p| p.kind == ColumnKind::Numeric && p.sample.is_none())
            .collect();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn profiles(&self) -> &[ColumnProfile] {
        &self.profiles
    }

    /// Sensor type of every column, in schema order.
    pub fn sensors(&self) -> Vec<SensorType> {
        self.profiles.iter().map(|p| p.sensor).collect()
    }

    pub fn rows_processed(&self) -> usize {
        self.rows_processed
    }

    /// Feed a row's valid numeric cells to an estimator without changing it.
    ///
    /// Used for the anchor pass of interpolation runs.
    pub fn collect_anchors<E: Estimator>(&self, estimator: &mut E, index: usize, row: &Row) {
        for (slot, (header, raw)) in row.iter().enumerate() {
            let Some(column) = self.schema.column_of(slot, header) else {
                continue;
            };
            let profile = &self.profiles[column];
            if profile.kind != ColumnKind::Numeric {
                continue;
            }
            if let CellState::Numeric(value) = self.detector.parse(raw)
                && self.validator.validate(profile.sensor, value)
            {
                estimator.observe(column, index, value);
            }
        }
    }

    /// Resolve every cell of a row.
    ///
    /// With `observe` set, valid values are pushed into the estimator as they
    /// are read (rolling mode). A row whose header set differs from the
    /// schema aborts with [`ImputationError::StructuralMismatch`].
    pub fn process_row<E: Estimator>(
        &mut self,
        estimator: &mut E,
        index: usize,
        mut row: Row,
        observe: bool,
    ) -> Result<Row> {
        self.schema.check(index, &row)?;
        let position = Position {
            index,
            hour: self.timestamp_hour(&row),
        };

        for (slot, (header, value)) in row.iter_mut().enumerate() {
            let column = self.schema.column_of(slot, header).ok_or_else(|| {
                ImputationError::Internal(format!("column '{header}' vanished after row check"))
            })?;
            let sensor = self.profiles[column].sensor;
            let kind = self.settle_kind(column, value);
            let summary = &mut self.summaries[column];

            match kind {
                ColumnKind::Text => {}
                ColumnKind::Datetime => {
                    if self.detector.is_missing(value) {
                        summary.missing += 1;
                        *value = self.sentinel.clone();
                    }
                }
                ColumnKind::Numeric => {
                    let needs_estimate = match self.detector.parse(value) {
                        CellState::Numeric(v) if self.validator.validate(sensor, v) => {
                            if observe {
                                estimator.observe(column, index, v);
                            }
                            false
                        }
                        CellState::Numeric(v) => {
                            summary.rejected += 1;
                            debug!("Row {}: '{}' value {} outside valid range", index, header, v);
                            true
                        }
                        CellState::Text(text) => {
                            summary.text_anomalies += 1;
                            debug!("Row {}: '{}' has non-numeric value '{}'", index, header, text);
                            true
                        }
                        CellState::Missing => {
                            summary.missing += 1;
                            true
                        }
                    };

                    if needs_estimate {
                        let estimate = estimator.estimate(column, position);
                        summary.imputed += 1;
                        if estimate.source.is_fallback() {
                            summary.fallback += 1;
                        }
                        *value = format_value(estimate.value, self.precision);
                    }
                }
            }
        }

        self.rows_processed += 1;
        Ok(row)
    }

    /// Log one warning per column that had observed values rejected.
    pub fn warn_rejections(&self) {
        for summary in self.summaries.iter().filter(|s| s.rejected > 0) {
            warn!(
                "Column '{}' ({}): {} observed values outside the valid range were replaced",
                summary.name, summary.sensor, summary.rejected
            );
        }
    }

    /// Close the run and aggregate its counters.
    pub fn finish(self, strategy: ImputationStrategy, duration_ms: u64) -> RunSummary {
        RunSummary::from_columns(strategy, self.rows_processed, self.summaries, duration_ms)
    }

    /// Kind of a column for the current cell, settling provisional columns.
    fn settle_kind(&mut self, column: usize, raw: &str) -> ColumnKind {
        if !self.provisional[column] {
            return self.profiles[column].kind;
        }

        match self.detector.parse(raw) {
            CellState::Missing => ColumnKind::Numeric,
            CellState::Numeric(_) => {
                self.provisional[column] = false;
                ColumnKind::Numeric
            }
            CellState::Text(text) => {
                self.provisional[column] = false;
                self.profiles[column].kind = ColumnKind::Text;
                self.summaries[column].kind = ColumnKind::Text;
                info!(
                    "Column '{}' starts with text ('{}'), passing it through",
                    self.profiles[column].name, text
                );
                ColumnKind::Text
            }
        }
    }

    fn timestamp_hour(&self, row: &Row) -> Option<u32> {
        let column = self.timestamp_column?;
        let header = self.schema.headers().get(column)?;
        let raw = match row.cell_at(column) {
            Some((h, v)) if h == header => v,
            _ => row.get(header)?,
        };
        hour_from_timestamp(raw)
    }
}
