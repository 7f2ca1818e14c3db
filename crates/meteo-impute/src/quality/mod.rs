//! Value quality checks.

pub mod bounds;

pub use bounds::{BoundsValidator, Fence};
