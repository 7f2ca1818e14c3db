//! Cell-level cleaning.
//!
//! Turns raw string cells into [`CellState`]s and formats estimated values
//! back into cell text.

pub mod detector;

pub use detector::{CellDetector, CellState, DEFAULT_MISSING_TOKENS, EXTENDED_MISSING_TOKENS};

/// Format an estimated value for writing back into a cell.
///
/// Rounds to `precision` decimal places and trims trailing zeros, keeping at
/// least one decimal so the cell still reads as a measurement.
pub fn format_value(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    if !formatted.contains('.') {
        return format!("{formatted}.0");
    }

    let trimmed = formatted.trim_end_matches('0');
    let trimmed = if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    };

    // "-0.0" reads oddly in a sensor column.
    if trimmed == "-0.0" {
        "0.0".to_string()
    } else {
        trimmed
    }
}
