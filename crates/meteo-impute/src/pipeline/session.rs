//! Streaming rolling-window imputation.

use crate::config::ImputationStrategy;
use crate::error::{ImputationError, Result};
use crate::imputers::RollingEstimator;
use crate::pipeline::executor::ImputationExecutor;
use crate::profiler::ColumnProfile;
use crate::types::{Row, RunSummary};
use std::time::Instant;
use tracing::{error, info};

/// Imputes rows one at a time with the rolling-window estimator.
///
/// Created by [`Imputer::rolling_session`](crate::Imputer::rolling_session).
/// Without a sampling pre-pass, each non-datetime column is numeric until
/// its first present cell: a text cell there turns it into a pass-through
/// column. A structural mismatch aborts the session: the failing push and
/// every later one return an error.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = imputer.rolling_session(headers)?;
/// for row in reader {
///     writer.write(session.push(row?)?)?;
/// }
/// let summary = session.finish();
/// ```
pub struct RollingSession {
    executor: ImputationExecutor,
    estimator: RollingEstimator,
    started: Instant,
    next_index: usize,
    aborted_at: Option<usize>,
}

static_assertions::assert_impl_all!(RollingSession: Send);

impl RollingSession {
    pub(crate) fn new(executor: ImputationExecutor, estimator: RollingEstimator) -> Self {
        info!(
            "Starting rolling session over {} columns...",
            executor.schema().len()
        );
        Self {
            executor,
            estimator,
            started: Instant::now(),
            next_index: 0,
            aborted_at: None,
        }
    }

    /// Column classifications for this session.
    pub fn profiles(&self) -> &[ColumnProfile] {
        self.executor.profiles()
    }

    /// Impute one row.
    pub fn push(&mut self, row: Row) -> Result<Row> {
        if let Some(row_index) = self.aborted_at {
            return Err(ImputationError::Internal(format!(
                "session aborted after structural mismatch at row {row_index}"
            )));
        }

        let index = self.next_index;
        match self
            .executor
            .process_row(&mut self.estimator, index, row, true)
        {
            Ok(row) => {
                self.next_index += 1;
                Ok(row)
            }
            Err(e) => {
                error!("Rolling session aborted: {}", e);
                self.aborted_at = Some(index);
                Err(e)
            }
        }
    }

    pub fn rows_processed(&self) -> usize {
        self.executor.rows_processed()
    }

    /// End the session and return its summary.
    pub fn finish(self) -> RunSummary {
        self.executor.warn_rejections();
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let summary = self.executor.finish(ImputationStrategy::Rolling, duration_ms);
        info!(
            "Rolling session complete: {} rows, {} values imputed ({} fallback)",
            summary.rows_processed, summary.values_imputed, summary.values_fallback
        );
        summary
    }
}
