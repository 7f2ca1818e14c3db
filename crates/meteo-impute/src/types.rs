//! Core data types shared across the engine.
//!
//! Rows are ordered `(header, cell)` pairs; the [`Schema`] fixed by the first
//! row checks every later one. [`RunSummary`] and [`ColumnSummary`] carry a
//! run's counters back to the caller.

use crate::config::ImputationStrategy;
use crate::error::{ImputationError, Result};
use crate::profiler::{ColumnKind, ColumnProfile};
use crate::profiler::sensors::SensorType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One record: ordered `(header, raw cell)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Append a cell.
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    /// Raw cell for a header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Cell at a position in this row's own order.
    pub fn cell_at(&self, slot: usize) -> Option<(&str, &str)> {
        self.cells.get(slot).map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut String)> {
        self.cells.iter_mut().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Header set established for a run.
#[derive(Debug, Clone)]
pub struct Schema {
    headers: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Establish the header set. Headers must be non-empty and distinct.
    pub fn new(headers: Vec<String>) -> Result<Self> {
        if headers.is_empty() {
            return Err(ImputationError::EmptyHeader);
        }

        let mut index = HashMap::with_capacity(headers.len());
        let mut duplicates = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            if index.insert(header.clone(), i).is_some() {
                duplicates.push(header.clone());
            }
        }

        if !duplicates.is_empty() {
            return Err(ImputationError::StructuralMismatch {
                row: 0,
                missing: Vec::new(),
                unexpected: duplicates,
            });
        }

        Ok(Self { headers, index })
    }

    /// Establish the header set from a row's headers, in that row's order.
    pub fn from_row(row: &Row) -> Result<Self> {
        Self::new(row.headers().map(str::to_string).collect())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Column index of a header found at `slot` in some row.
    pub fn column_of(&self, slot: usize, header: &str) -> Option<usize> {
        if self.headers.get(slot).is_some_and(|h| h == header) {
            return Some(slot);
        }
        self.index.get(header).copied()
    }

    /// Check that a row carries exactly this header set.
    ///
    /// Column order may differ; names may not.
    pub fn check(&self, row_index: usize, row: &Row) -> Result<()> {
        if row.len() == self.headers.len()
            && row.headers().zip(&self.headers).all(|(a, b)| a == b)
        {
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(row.len());
        let mut unexpected = Vec::new();
        for header in row.headers() {
            if !self.index.contains_key(header) || !seen.insert(header) {
                unexpected.push(header.to_string());
            }
        }
        let missing: Vec<String> = self
            .headers
            .iter()
            .filter(|h| !seen.contains(h.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }

        Err(ImputationError::StructuralMismatch {
            row: row_index,
            missing,
            unexpected,
        })
    }
}

/// Per-column counters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub sensor: SensorType,
    pub kind: ColumnKind,
    /// Cells that were missing in the input.
    pub missing: usize,
    /// Cells replaced with an estimate.
    pub imputed: usize,
    /// Replacements that came from a fallback rather than the estimator.
    pub fallback: usize,
    /// Observed values rejected by the bounds validator.
    pub rejected: usize,
    /// Non-numeric text found in a numeric column.
    pub text_anomalies: usize,
    /// Share of rows whose cell was missing.
    pub missing_ratio: f64,
}

impl ColumnSummary {
    pub fn new(profile: &ColumnProfile) -> Self {
        Self {
            name: profile.name.clone(),
            sensor: profile.sensor,
            kind: profile.kind,
            missing: 0,
            imputed: 0,
            fallback: 0,
            rejected: 0,
            text_anomalies: 0,
            missing_ratio: 0.0,
        }
    }
}

/// Counters aggregated per sensor type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub columns: usize,
    pub imputed: usize,
    pub fallback: usize,
    pub rejected: usize,
}

/// Result object returned at the end of a run.
///
/// # Example
///
/// ```rust,ignore
/// let output = imputer.impute(rows)?;
/// println!(
///     "Imputed {} values ({} fallback) in {}ms",
///     output.summary.values_imputed,
///     output.summary.values_fallback,
///     output.summary.duration_ms,
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub strategy: ImputationStrategy,
    pub rows_processed: usize,
    pub values_imputed: usize,
    pub values_fallback: usize,
    pub rejected_observations: usize,
    pub text_anomalies: usize,
    /// Share of imputed values that came from the estimator rather than a fallback.
    pub interpolation_ratio: f64,
    pub duration_ms: u64,
    pub rows_per_second: f64,
    pub per_type: BTreeMap<SensorType, TypeBreakdown>,
    pub columns: Vec<ColumnSummary>,
}

impl RunSummary {
    /// Aggregate per-column counters into a run summary.
    pub fn from_columns(
        strategy: ImputationStrategy,
        rows_processed: usize,
        mut columns: Vec<ColumnSummary>,
        duration_ms: u64,
    ) -> Self {
        let mut per_type: BTreeMap<SensorType, TypeBreakdown> = BTreeMap::new();
        let mut values_imputed = 0;
        let mut values_fallback = 0;
        let mut rejected_observations = 0;
        let mut text_anomalies = 0;

        for column in &mut columns {
            column.missing_ratio = if rows_processed > 0 {
                column.missing as f64 / rows_processed as f64
            } else {
                0.0
            };

            values_imputed += column.imputed;
            values_fallback += column.fallback;
            rejected_observations += column.rejected;
            text_anomalies += column.text_anomalies;

            let entry = per_type.entry(column.sensor).or_default();
            entry.columns += 1;
            entry.imputed += column.imputed;
            entry.fallback += column.fallback;
            entry.rejected += column.rejected;
        }

        let interpolation_ratio = if values_imputed > 0 {
            (values_imputed - values_fallback) as f64 / values_imputed as f64
        } else {
            0.0
        };

        let rows_per_second = if duration_ms > 0 {
            rows_processed as f64 * 1000.0 / duration_ms as f64
        } else {
            rows_processed as f64
        };

        Self {
            strategy,
            rows_processed,
            values_imputed,
            values_fallback,
            rejected_observations,
            text_anomalies,
            interpolation_ratio,
            duration_ms,
            rows_per_second,
            per_type,
            columns,
        }
    }

    /// Summary for a run over no rows.
    pub fn empty(strategy: ImputationStrategy) -> Self {
        Self::from_columns(strategy, 0, Vec::new(), 0)
    }

    /// Counters for one column.
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Rows with every cell resolved, plus the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationOutput {
    pub rows: Vec<Row>,
    pub summary: RunSummary,
    pub profiles: Vec<ColumnProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn schema(headers: &[&str]) -> Schema {
        Schema::new(headers.iter().map(|h| h.to_string()).collect()).unwrap()
    }

    // ==================== Row ====================

    #[test]
    fn test_row_accessors() {
        let mut r = row(&[("Temp Out", "21.5"), ("Hum", "")]);
        r.push("Bar", "1013.2");

        assert_eq!(r.len(), 3);
        assert_eq!(r.get("Hum"), Some(""));
        assert_eq!(r.get("Rain"), None);
        assert_eq!(r.cell_at(2), Some(("Bar", "1013.2")));
        assert_eq!(r.headers().collect::<Vec<_>>(), vec!["Temp Out", "Hum", "Bar"]);

        for (_, value) in r.iter_mut() {
            value.push('!');
        }
        assert_eq!(r.get("Temp Out"), Some("21.5!"));
    }

    // ==================== Schema ====================

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(
            Schema::new(Vec::new()),
            Err(ImputationError::EmptyHeader)
        ));
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let result = Schema::new(vec!["Hum".to_string(), "Hum".to_string()]);
        assert!(matches!(
            result,
            Err(ImputationError::StructuralMismatch { .. })
        ));
    }

    #[test]
    fn test_schema_check_accepts_permutation() {
        let s = schema(&["Date", "Temp Out", "Hum"]);
        assert!(s.check(0, &row(&[("Date", ""), ("Temp Out", ""), ("Hum", "")])).is_ok());
        assert!(s.check(1, &row(&[("Hum", ""), ("Date", ""), ("Temp Out", "")])).is_ok());
    }

    #[test]
    fn test_schema_check_reports_discrepancy() {
        let s = schema(&["Date", "Temp Out", "Hum"]);
        let err = s
            .check(4, &row(&[("Date", ""), ("Temp Out", ""), ("Humidity", "")]))
            .unwrap_err();

        match err {
            ImputationError::StructuralMismatch {
                row,
                missing,
                unexpected,
            } => {
                assert_eq!(row, 4);
                assert_eq!(missing, vec!["Hum".to_string()]);
                assert_eq!(unexpected, vec!["Humidity".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_check_missing_and_extra_columns() {
        let s = schema(&["A", "B"]);
        assert!(s.check(1, &row(&[("A", "")])).is_err());
        assert!(s.check(1, &row(&[("A", ""), ("B", ""), ("C", "")])).is_err());
        assert!(s.check(1, &row(&[("A", ""), ("A", "")])).is_err());
    }

    #[test]
    fn test_column_of_uses_header_not_slot() {
        let s = schema(&["A", "B", "C"]);
        assert_eq!(s.column_of(0, "A"), Some(0));
        assert_eq!(s.column_of(0, "C"), Some(2));
        assert_eq!(s.column_of(1, "Z"), None);
    }

    // ==================== RunSummary ====================

    fn column(name: &str, sensor: SensorType, imputed: usize, fallback: usize) -> ColumnSummary {
        ColumnSummary {
            name: name.to_string(),
            sensor,
            kind: ColumnKind::Numeric,
            missing: imputed,
            imputed,
            fallback,
            rejected: 0,
            text_anomalies: 0,
            missing_ratio: 0.0,
        }
    }

    #[test]
    fn test_run_summary_aggregates() {
        let summary = RunSummary::from_columns(
            ImputationStrategy::Interpolation,
            100,
            vec![
                column("Temp Out", SensorType::Temperature, 6, 2),
                column("Hi Temp", SensorType::Temperature, 2, 0),
                column("Hum", SensorType::Humidity, 2, 2),
            ],
            50,
        );

        assert_eq!(summary.values_imputed, 10);
        assert_eq!(summary.values_fallback, 4);
        assert!((summary.interpolation_ratio - 0.6).abs() < 1e-12);
        assert_eq!(summary.rows_per_second, 2000.0);

        let temp = &summary.per_type[&SensorType::Temperature];
        assert_eq!(temp.columns, 2);
        assert_eq!(temp.imputed, 8);
        assert_eq!(summary.column("Temp Out").unwrap().missing_ratio, 0.06);
    }

    #[test]
    fn test_empty_summary() {
        let summary = RunSummary::empty(ImputationStrategy::Rolling);
        assert_eq!(summary.rows_processed, 0);
        assert_eq!(summary.interpolation_ratio, 0.0);
        assert!(summary.per_type.is_empty());
    }

    #[test]
    fn test_summary_serializes_type_keys() {
        let summary = RunSummary::from_columns(
            ImputationStrategy::Rolling,
            10,
            vec![column("Wind Dir", SensorType::WindDirection, 1, 0)],
            0,
        );
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"wind-direction\""));
        assert!(json.contains("\"values_imputed\":1"));
    }
}
