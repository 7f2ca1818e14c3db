//! Tabular adapter between CSV files, polars DataFrames and engine rows.
//!
//! Files are read with every column as a string so the engine sees raw cell
//! text. Invalid UTF-8 is replaced rather than rejected and empty fields stay
//! empty strings.

use crate::error::{ImputationError, Result, ResultExt};
use crate::types::Row;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read a CSV file as all-string columns.
///
/// `skip_rows` lines are dropped before the header (some station exports
/// carry a title line).
pub fn read_csv(path: impl AsRef<Path>, skip_rows: usize) -> Result<DataFrame> {
    let path = path.as_ref();
    debug!("Reading {} (skipping {} leading rows)", path.display(), skip_rows);

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_skip_rows(skip_rows)
        .with_parse_options(
            CsvParseOptions::default()
                .with_encoding(CsvEncoding::LossyUtf8)
                .with_quote_char(Some(b'"'))
                .with_missing_is_null(false),
        )
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))
}

/// Column names of a DataFrame, in order.
pub fn headers(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Convert a DataFrame into rows of raw cells. Nulls become empty cells.
pub fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<Row>> {
    let names = headers(df);
    let columns = df
        .get_columns()
        .iter()
        .map(|column| column.cast(&DataType::String))
        .collect::<PolarsResult<Vec<Column>>>()
        .context("Failed to cast columns to strings")?;
    let strings = columns
        .iter()
        .map(|column| column.as_materialized_series().str())
        .collect::<PolarsResult<Vec<&StringChunked>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for index in 0..df.height() {
        let mut row = Row::with_capacity(names.len());
        for (name, values) in names.iter().zip(&strings) {
            row.push(name.as_str(), values.get(index).unwrap_or(""));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Build a DataFrame of string columns from rows, in `headers` order.
pub fn rows_to_dataframe(headers: &[String], rows: &[Row]) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(headers.len());

    for (slot, header) in headers.iter().enumerate() {
        let values = rows
            .iter()
            .map(|row| match row.cell_at(slot) {
                Some((h, v)) if h == header => Ok(v),
                _ => row
                    .get(header)
                    .ok_or_else(|| ImputationError::ColumnNotFound(header.clone())),
            })
            .collect::<Result<Vec<&str>>>()?;
        columns.push(Column::new(header.as_str().into(), values));
    }

    DataFrame::new(columns).context("Failed to assemble output frame")
}

/// Write a DataFrame as CSV with a header line.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)
        .map_err(|e| ImputationError::Io(e).with_context(format!("Failed to create {}", path.display())))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Failed to write {}", path.display()))?;

    info!("Output saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/station_sample.csv")
    }

    #[test]
    fn test_read_fixture_as_strings() {
        let df = read_csv(fixture(), 0).unwrap();
        assert!(df.height() > 0);
        for column in df.get_columns() {
            assert_eq!(column.dtype(), &DataType::String);
        }
        assert_eq!(headers(&df)[0], "Date");
    }

    #[test]
    fn test_dataframe_to_rows_maps_nulls_to_empty() {
        let df = df!(
            "Temp Out" => [Some("21.5"), None],
            "Hum" => [Some("40"), Some("41")]
        )
        .unwrap();

        let rows = dataframe_to_rows(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Temp Out"), Some(""));
        assert_eq!(rows[1].get("Hum"), Some("41"));
    }

    #[test]
    fn test_rows_to_dataframe_follows_header_order() {
        let rows: Vec<Row> = vec![
            [("A", "1"), ("B", "2")].into_iter().collect(),
            [("B", "4"), ("A", "3")].into_iter().collect(),
        ];
        let df = rows_to_dataframe(&["A".to_string(), "B".to_string()], &rows).unwrap();

        let a: Vec<_> = df
            .column("A")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(a, vec!["1", "3"]);
    }

    #[test]
    fn test_rows_to_dataframe_missing_column() {
        let rows: Vec<Row> = vec![[("A", "1")].into_iter().collect()];
        let err = rows_to_dataframe(&["A".to_string(), "B".to_string()], &rows).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_write_and_read_back() {
        let rows: Vec<Row> = vec![[("Date", "3/1/24 12:00 AM"), ("Hum", "55.0")].into_iter().collect()];
        let mut df = rows_to_dataframe(&["Date".to_string(), "Hum".to_string()], &rows).unwrap();

        let path = std::env::temp_dir().join(format!("meteo-impute-frame-{}.csv", std::process::id()));
        write_csv(&mut df, &path).unwrap();
        let back = dataframe_to_rows(&read_csv(&path, 0).unwrap()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back, rows);
    }
}
