//! Main imputation engine module.
//!
//! This module provides the core `Imputer` struct and builder for
//! orchestrating an imputation run.

use crate::cleaner::CellDetector;
use crate::config::{ConfigValidationError, ImputationConfig, ImputationStrategy};
use crate::error::Result;
use crate::imputers::{
    DiurnalClock, Estimator, FallbackPolicy, InterpolationEstimator, RollingEstimator,
};
use crate::pipeline::ImputationExecutor;
use crate::pipeline::progress::{
    ClosureProgressReporter, ImputationStage, PROGRESS_INTERVAL, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::session::RollingSession;
use crate::profiler::sensors::SensorRegistry;
use crate::profiler::{ColumnProfile, DataProfiler};
use crate::quality::{BoundsValidator, Fence};
use crate::types::{ImputationOutput, Row, RunSummary, Schema};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The imputation engine.
///
/// Use [`Imputer::builder()`] to create a new engine with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use meteo_impute::{Imputer, ImputationConfig, ImputationStrategy};
///
/// let config = ImputationConfig::builder()
///     .strategy(ImputationStrategy::Interpolation)
///     .build()?;
///
/// let output = Imputer::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .impute(rows)?;
///
/// println!("{} values imputed", output.summary.values_imputed);
/// ```
pub struct Imputer {
    config: ImputationConfig,
    registry: SensorRegistry,
    validator: BoundsValidator,
    detector: CellDetector,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Runs may be handed to a worker thread.
static_assertions::assert_impl_all!(Imputer: Send, Sync);

impl Imputer {
    /// Create a new engine builder.
    pub fn builder() -> ImputerBuilder {
        ImputerBuilder::default()
    }

    pub fn config(&self) -> &ImputationConfig {
        &self.config
    }

    /// Impute every missing or invalid numeric cell of `rows`.
    ///
    /// The header set of the first row is the run's schema; every other row
    /// must carry the same headers (in any order).
    ///
    /// # Errors
    ///
    /// Returns [`ImputationError::StructuralMismatch`](crate::ImputationError::StructuralMismatch)
    /// if any row's header set differs, and `EmptyHeader` if the first row has
    /// no cells. Nothing else in the data aborts a run.
    pub fn impute(&self, rows: Vec<Row>) -> Result<ImputationOutput> {
        match self.impute_internal(rows) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Imputed {} values across {} rows",
                    output.summary.values_imputed, output.summary.rows_processed
                )));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Imputation error: {}", e);
                Err(e)
            }
        }
    }

    /// Classify and sample columns without imputing anything.
    pub fn profile(&self, rows: &[Row]) -> Result<Vec<ColumnProfile>> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let schema = Schema::from_row(first)?;
        for (index, row) in rows.iter().enumerate() {
            schema.check(index, row)?;
        }

        Ok(DataProfiler::profile_columns(
            &schema,
            rows,
            self.config.sample_rows,
            self.config.min_numeric_ratio,
            &self.detector,
            &self.validator,
        ))
    }

    /// Start a streaming rolling-window session over a fixed header set.
    ///
    /// The session always uses the rolling strategy, whatever the configured
    /// strategy is, since interpolation needs the whole series. With no
    /// sampling pass, a column's first present cell decides its kind: text
    /// there makes it a pass-through column for the rest of the session.
    pub fn rolling_session(&self, headers: Vec<String>) -> Result<RollingSession> {
        let schema = Schema::new(headers)?;
        let profiles = DataProfiler::classify_columns(&schema);
        let executor = self.executor(schema, profiles).with_provisional_kinds();
        let estimator = self.rolling_estimator(&executor);
        Ok(RollingSession::new(executor, estimator))
    }

    /// Start a streaming session with column kinds taken from an earlier
    /// [`profile`](Self::profile) call, in header order.
    pub fn rolling_session_with_profiles(
        &self,
        profiles: Vec<ColumnProfile>,
    ) -> Result<RollingSession> {
        let schema = Schema::new(profiles.iter().map(|p| p.name.clone()).collect())?;
        let executor = self.executor(schema, profiles);
        let estimator = self.rolling_estimator(&executor);
        Ok(RollingSession::new(executor, estimator))
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy::new(
            self.registry.clone(),
            DiurnalClock::new(self.config.sample_interval_minutes),
        )
    }

    fn executor(&self, schema: Schema, profiles: Vec<ColumnProfile>) -> ImputationExecutor {
        ImputationExecutor::new(
            schema,
            profiles,
            &self.config,
            self.detector.clone(),
            self.validator.clone(),
        )
    }

    fn rolling_estimator(&self, executor: &ImputationExecutor) -> RollingEstimator {
        RollingEstimator::new(
            &executor.sensors(),
            self.config.window_size,
            self.validator.clone(),
            self.fallback_policy(),
        )
    }

    fn impute_internal(&self, rows: Vec<Row>) -> Result<ImputationOutput> {
        let start_time = Instant::now();
        let strategy = self.config.strategy;

        info!("Starting imputation run ({} strategy)...", strategy.as_str());
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Initializing,
            0.0,
            "Starting imputation run...",
        ));

        let Some(first) = rows.first() else {
            info!("No rows to impute");
            return Ok(ImputationOutput {
                rows,
                summary: RunSummary::empty(strategy),
                profiles: Vec::new(),
            });
        };

        // Step 1: Structure check
        info!("Step 1: Checking row structure...");
        let schema = Schema::from_row(first)?;
        for (index, row) in rows.iter().enumerate() {
            schema.check(index, row)?;
        }
        debug!("Schema: {} columns, {} rows", schema.len(), rows.len());

        // Step 2: Sampling
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Sampling,
            0.0,
            "Sampling column distributions...",
        ));
        info!("Step 2: Sampling column distributions...");
        let profiles = DataProfiler::profile_columns(
            &schema,
            &rows,
            self.config.sample_rows,
            self.config.min_numeric_ratio,
            &self.detector,
            &self.validator,
        );

        let mut executor = self.executor(schema, profiles.clone());

        // Step 3: Imputation
        let total = rows.len();
        let rows = match strategy {
            ImputationStrategy::Rolling => {
                self.report_progress(ProgressUpdate::new(
                    ImputationStage::Sampling,
                    1.0,
                    "Sampling complete",
                ));
                info!("Step 3: Rolling-window imputation over {} rows...", total);
                let mut estimator = self.rolling_estimator(&executor);
                self.fill_rows(&mut executor, &mut estimator, rows, true)?
            }
            ImputationStrategy::Interpolation => {
                info!("Step 3: Collecting interpolation anchors...");
                let mut estimator =
                    InterpolationEstimator::new(&executor.sensors(), self.fallback_policy());
                for (index, row) in rows.iter().enumerate() {
                    executor.collect_anchors(&mut estimator, index, row);
                }
                for (column, profile) in profiles.iter().enumerate() {
                    let fence = profile
                        .sample
                        .as_ref()
                        .and_then(|sample| sample.stats.as_ref())
                        .map(Fence::from_stats);
                    estimator.set_fence(column, fence);
                }
                self.report_progress(ProgressUpdate::new(
                    ImputationStage::Sampling,
                    1.0,
                    "Anchors collected",
                ));

                info!("Step 4: Interpolating gaps over {} rows...", total);
                self.fill_rows(&mut executor, &mut estimator, rows, false)?
            }
        };

        executor.warn_rejections();
        let duration_ms = start_time.elapsed().as_millis() as u64;
        let summary = executor.finish(strategy, duration_ms);

        info!(
            "Imputation complete: {} values imputed ({} fallback, {:.1}% estimated) in {}ms",
            summary.values_imputed,
            summary.values_fallback,
            summary.interpolation_ratio * 100.0,
            summary.duration_ms
        );

        Ok(ImputationOutput {
            rows,
            summary,
            profiles,
        })
    }

    fn fill_rows<E: Estimator>(
        &self,
        executor: &mut ImputationExecutor,
        estimator: &mut E,
        rows: Vec<Row>,
        observe: bool,
    ) -> Result<Vec<Row>> {
        let total = rows.len();
        let mut output = Vec::with_capacity(total);

        for (index, row) in rows.into_iter().enumerate() {
            output.push(executor.process_row(estimator, index, row, observe)?);

            let done = index + 1;
            if done % PROGRESS_INTERVAL == 0 {
                debug!("Processed {} of {} rows", done, total);
                self.report_progress(ProgressUpdate::with_items(
                    ImputationStage::Imputing,
                    "Rows",
                    done,
                    total,
                    format!("Imputed {} of {} rows", done, total),
                ));
            }
        }

        Ok(output)
    }
}

/// Builder for creating an [`Imputer`] instance.
///
/// Use [`Imputer::builder()`] to get started.
#[derive(Default)]
pub struct ImputerBuilder {
    config: Option<ImputationConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(ImputerBuilder: Send);

impl ImputerBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: ImputationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the engine.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Imputer, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let registry = SensorRegistry::with_overrides(&config.overrides);
        let validator = BoundsValidator::new(&registry);
        let detector = CellDetector::new(&config.missing_tokens);

        Ok(Imputer {
            config,
            registry,
            validator,
            detector,
            progress_reporter: self.progress_reporter,
        })
    }
}
