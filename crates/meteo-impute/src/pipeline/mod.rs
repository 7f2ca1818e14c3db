//! Pipeline module.
//!
//! This module provides the imputation engine, its builder, the streaming
//! session and progress reporting.

mod builder;
mod executor;
pub mod progress;
mod session;

pub use builder::{Imputer, ImputerBuilder};
pub use executor::ImputationExecutor;
pub use progress::{ClosureProgressReporter, ImputationStage, ProgressReporter, ProgressUpdate};
pub use session::RollingSession;
