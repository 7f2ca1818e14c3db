//! Cell parsing and missing-value detection.

use std::collections::HashSet;

/// Missing markers recognised by default (compared case-insensitively).
pub const DEFAULT_MISSING_TOKENS: [&str; 5] = ["-", "--", "nan", "none", "null"];

/// Additional markers seen in spreadsheet exports of station data.
///
/// "missing" is left out: it would swallow the default datetime sentinel.
pub const EXTENDED_MISSING_TOKENS: [&str; 11] = [
    "---",
    "----",
    "n/a",
    "na",
    "unknown",
    "#n/a",
    "#null",
    "?",
    "nil",
    "undefined",
    "blank",
];

/// Parsed state of a raw cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellState<'a> {
    /// Empty, whitespace-only, or a missing marker.
    Missing,
    /// Parsed as a number. The value may still be non-finite.
    Numeric(f64),
    /// Non-numeric, non-missing text (trimmed).
    Text(&'a str),
}

impl CellState<'_> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric value, if the cell parsed as one.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            _ => None,
        }
    }
}

/// Classifies raw cells as missing, numeric or text.
#[derive(Debug, Clone)]
pub struct CellDetector {
    tokens: HashSet<String>,
}

impl Default for CellDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING_TOKENS)
    }
}

impl CellDetector {
    /// Create a detector for the given missing markers.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tokens }
    }

    /// Check if a raw cell represents a missing reading.
    pub fn is_missing(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty() || self.tokens.contains(&trimmed.to_lowercase())
    }

    /// Parse a raw cell.
    pub fn parse<'a>(&self, raw: &'a str) -> CellState<'a> {
        let trimmed = raw.trim();
        if self.is_missing(trimmed) {
            return CellState::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(value) => CellState::Numeric(value),
            Err(_) => CellState::Text(trimmed),
        }
    }
}
