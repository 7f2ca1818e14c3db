//! Weather-Station Imputation Library
//!
//! Sensor-aware gap filling for tabular weather-station telemetry, built with
//! Rust and Polars.
//!
//! # Overview
//!
//! Station exports arrive as rows of raw cell text keyed by column header.
//! Cells go missing, sensors report sentinel garbage and loggers write error
//! strings where numbers belong. This library repairs those cells while
//! leaving every valid observation exactly as it was read:
//!
//! - **Sensor Classification**: Column headers are mapped to physical sensor
//!   types, each with a valid range, fallback value and estimation hint
//! - **Distribution Sampling**: A bounded sample of each column drives text
//!   detection and the interpolation outlier fence
//! - **Rolling Imputation**: A causal median (or last value) over a sliding
//!   window of recent valid observations
//! - **Interpolation Imputation**: Linear interpolation between the nearest
//!   valid anchors, fenced against the sampled distribution
//! - **Diurnal Fallback**: Range-checked defaults nudged by time of day when
//!   a column has nothing to estimate from
//! - **Run Summary**: Per-column and per-sensor counters of what was filled
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use meteo_impute::{Imputer, ImputationConfig, ImputationStrategy, frame};
//!
//! let df = frame::read_csv("station.csv", 0)?;
//! let headers = frame::headers(&df);
//! let rows = frame::dataframe_to_rows(&df)?;
//!
//! // Option 1: Defaults (rolling window of 12 observations)
//! let output = Imputer::builder().build()?.impute(rows.clone())?;
//!
//! // Option 2: Interpolation with progress reporting
//! let config = ImputationConfig::builder()
//!     .strategy(ImputationStrategy::Interpolation)
//!     .sample_interval_minutes(5)
//!     .build()?;
//!
//! let output = Imputer::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .impute(rows)?;
//!
//! println!("{} values imputed", output.summary.values_imputed);
//!
//! let mut out = frame::rows_to_dataframe(&headers, &output.rows)?;
//! frame::write_csv(&mut out, "station_imputed.csv")?;
//! ```
//!
//! # Streaming
//!
//! The rolling strategy only looks backwards, so it can also run one row at
//! a time through a [`RollingSession`]:
//!
//! ```rust,ignore
//! let mut session = Imputer::builder().build()?.rolling_session(headers)?;
//! for row in rows {
//!     let filled = session.push(row)?;
//!     // ...
//! }
//! let summary = session.finish();
//! ```
//!
//! # Configuration
//!
//! Use [`ImputationConfig`] to customize a run. Per-sensor range and
//! fallback overrides replace the built-in defaults:
//!
//! ```rust,ignore
//! use meteo_impute::{ImputationConfig, SensorOverride, SensorType};
//!
//! let config = ImputationConfig::builder()
//!     .window_size(24)
//!     .missing_tokens(ImputationConfig::extended_missing_tokens())
//!     .sensor_override(
//!         SensorType::Pressure,
//!         SensorOverride { min: Some(950.0), max: Some(1050.0), fallback: None },
//!     )
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod frame;
pub mod imputers;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod types;

// Re-exports for convenient access
pub use cleaner::{CellDetector, CellState, format_value};
pub use config::{
    ConfigValidationError, ImputationConfig, ImputationConfigBuilder, ImputationStrategy,
    SensorOverride,
};
pub use error::{ImputationError, Result as ImputationResult, ResultExt};
pub use imputers::{
    Estimate, EstimateSource, Estimator, FallbackPolicy, InterpolationEstimator, RollingEstimator,
    RollingWindow, WindowPhase, interpolate,
};
pub use pipeline::{
    ClosureProgressReporter, ImputationExecutor, ImputationStage, Imputer, ImputerBuilder,
    ProgressReporter, ProgressUpdate, RollingSession,
};
pub use profiler::sensors::{SensorRegistry, SensorType, StrategyHint, ValidRange};
pub use profiler::{ColumnKind, ColumnProfile, DataProfiler};
pub use quality::{BoundsValidator, Fence};
pub use types::{ColumnSummary, ImputationOutput, Row, RunSummary, Schema, TypeBreakdown};
