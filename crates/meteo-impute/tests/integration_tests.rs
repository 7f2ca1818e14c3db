//! Integration tests for the imputation engine.
//!
//! These tests verify end-to-end behavior of both strategies over in-memory
//! rows and over a station CSV fixture.

use meteo_impute::{
    ImputationConfig, ImputationError, ImputationStrategy, Imputer, Row, SensorOverride,
    SensorType, frame,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> (Vec<String>, Vec<Row>) {
    let df = frame::read_csv(fixtures_path().join(filename), 0).expect("Failed to read CSV file");
    let headers = frame::headers(&df);
    let rows = frame::dataframe_to_rows(&df).expect("Failed to convert rows");
    (headers, rows)
}

/// Build rows for a single column, one cell per row.
fn column_rows(header: &str, cells: &[&str]) -> Vec<Row> {
    cells.iter().map(|cell| [(header, *cell)].into_iter().collect()).collect()
}

fn column(rows: &[Row], header: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.get(header).unwrap_or_default().to_string())
        .collect()
}

fn imputer(strategy: ImputationStrategy) -> Imputer {
    let config = ImputationConfig::builder().strategy(strategy).build().unwrap();
    Imputer::builder().config(config).build().unwrap()
}

// ============================================================================
// Rolling Strategy
// ============================================================================

#[test]
fn test_complete_column_is_untouched() {
    let cells = ["55", "56.5", " 57 ", "58.25"];
    let output = imputer(ImputationStrategy::Rolling)
        .impute(column_rows("Out Hum", &cells))
        .unwrap();

    assert_eq!(column(&output.rows, "Out Hum"), cells.map(String::from).to_vec());
    assert_eq!(output.summary.values_imputed, 0);
}

#[test]
fn test_wind_direction_persists_last_value() {
    let output = imputer(ImputationStrategy::Rolling)
        .impute(column_rows("Wind Direction", &["90", "200", "15", ""]))
        .unwrap();

    assert_eq!(output.rows[3].get("Wind Direction"), Some("15.0"));
    assert_eq!(output.summary.values_fallback, 0);
}

#[test]
fn test_rolling_median_of_window() {
    let output = imputer(ImputationStrategy::Rolling)
        .impute(column_rows("Temp Out", &["10", "30", "11", "12", "", "nan"]))
        .unwrap();

    // Window [10, 30, 11, 12]: median averages 11 and 12.
    assert_eq!(output.rows[4].get("Temp Out"), Some("11.5"));
    assert_eq!(output.rows[5].get("Temp Out"), Some("11.5"));
    assert_eq!(output.summary.values_imputed, 2);
}

#[test]
fn test_rolling_window_only_keeps_last_k() {
    let config = ImputationConfig::builder().window_size(3).build().unwrap();
    let output = Imputer::builder()
        .config(config)
        .build()
        .unwrap()
        .impute(column_rows("Out Hum", &["90", "90", "90", "40", "41", "42", ""]))
        .unwrap();

    assert_eq!(output.rows[6].get("Out Hum"), Some("41.0"));
}

#[test]
fn test_diurnal_fallback_by_hour() {
    // 5-minute cadence: row 120 is 10:00, row 264 is 22:00.
    let cells = vec![""; 265];
    for strategy in [ImputationStrategy::Rolling, ImputationStrategy::Interpolation] {
        let output = imputer(strategy).impute(column_rows("Temp Out", &cells)).unwrap();

        assert_eq!(output.rows[120].get("Temp Out"), Some("23.0"));
        assert_eq!(output.rows[264].get("Temp Out"), Some("18.0"));
        assert_eq!(output.summary.values_fallback, 265);
    }
}

#[test]
fn test_out_of_range_observation_is_rejected() {
    let output = imputer(ImputationStrategy::Rolling)
        .impute(column_rows("Bar", &["1012.5", "-9999", "1013.5", ""]))
        .unwrap();

    assert_eq!(output.rows[1].get("Bar"), Some("1012.5"));
    // The rejected value never entered the window.
    assert_eq!(output.rows[3].get("Bar"), Some("1013.0"));
    assert_eq!(output.summary.rejected_observations, 1);
    assert_eq!(output.summary.values_imputed, 2);
}

#[test]
fn test_sensor_override_changes_range_and_fallback() {
    let config = ImputationConfig::builder()
        .sensor_override(
            SensorType::Pressure,
            SensorOverride {
                min: Some(600.0),
                max: None,
                fallback: Some(700.0),
            },
        )
        .build()
        .unwrap();
    let output = Imputer::builder()
        .config(config)
        .build()
        .unwrap()
        .impute(column_rows("Bar", &["", "650"]))
        .unwrap();

    assert_eq!(output.rows[0].get("Bar"), Some("700.0"));
    assert_eq!(output.rows[1].get("Bar"), Some("650"));
    assert_eq!(output.summary.rejected_observations, 0);
}

// ============================================================================
// Interpolation Strategy
// ============================================================================

#[test]
fn test_interior_gap_gets_linear_ramp() {
    let output = imputer(ImputationStrategy::Interpolation)
        .impute(column_rows("Temp Out", &["8", "9", "10", "", "", "", "18", "19", "20"]))
        .unwrap();

    assert_eq!(
        column(&output.rows, "Temp Out")[3..6].to_vec(),
        vec!["12.0", "14.0", "16.0"]
    );
    assert_eq!(output.summary.values_imputed, 3);
    assert_eq!(output.summary.values_fallback, 0);
    assert_eq!(output.summary.interpolation_ratio, 1.0);
}

#[test]
fn test_leading_gap_uses_first_anchor() {
    let output = imputer(ImputationStrategy::Interpolation)
        .impute(column_rows("Out Hum", &["", "", "", "", "", "20", "21", "22"]))
        .unwrap();

    assert_eq!(column(&output.rows, "Out Hum")[..5].to_vec(), vec!["20.0"; 5]);
    assert_eq!(output.summary.values_fallback, 5);
}

#[test]
fn test_fence_rejection_uses_nearer_anchor() {
    let mut cells = vec!["10"; 21];
    cells.extend(["", "", "", "58"]);
    let output = imputer(ImputationStrategy::Interpolation)
        .impute(column_rows("Temp Out", &cells))
        .unwrap();

    // Every sampled value but one is 10, so the fence collapses to [10, 10].
    assert_eq!(
        column(&output.rows, "Temp Out")[21..24].to_vec(),
        vec!["10.0", "10.0", "58.0"]
    );
    assert_eq!(output.summary.values_fallback, 3);
    assert_eq!(output.summary.interpolation_ratio, 0.0);
}

// ============================================================================
// Run-level Properties
// ============================================================================

#[test]
fn test_rerun_on_output_is_noop() {
    let (_, rows) = load_fixture("station_sample.csv");
    for strategy in [ImputationStrategy::Rolling, ImputationStrategy::Interpolation] {
        let engine = imputer(strategy);
        let first = engine.impute(rows.clone()).unwrap();
        let second = engine.impute(first.rows.clone()).unwrap();

        assert_eq!(second.summary.values_imputed, 0);
        assert_eq!(second.rows, first.rows);
    }
}

#[test]
fn test_structural_mismatch_aborts_run() {
    let mut rows = column_rows("Temp Out", &["10", "11"]);
    rows.push([("Temp Out", "12"), ("Out Hum", "40")].into_iter().collect());

    let err = imputer(ImputationStrategy::Rolling).impute(rows).unwrap_err();
    match err {
        ImputationError::StructuralMismatch {
            row,
            missing,
            unexpected,
        } => {
            assert_eq!(row, 2);
            assert!(missing.is_empty());
            assert_eq!(unexpected, vec!["Out Hum".to_string()]);
        }
        other => panic!("expected structural mismatch, got {other}"),
    }
}

#[test]
fn test_permuted_rows_keep_their_order() {
    let rows: Vec<Row> = vec![
        [("Temp Out", "10"), ("Out Hum", "40")].into_iter().collect(),
        [("Out Hum", ""), ("Temp Out", "")].into_iter().collect(),
    ];
    let output = imputer(ImputationStrategy::Rolling).impute(rows).unwrap();

    let headers: Vec<_> = output.rows[1].headers().collect();
    assert_eq!(headers, vec!["Out Hum", "Temp Out"]);
    assert_eq!(output.rows[1].get("Out Hum"), Some("40.0"));
    assert_eq!(output.rows[1].get("Temp Out"), Some("10.0"));
}

// ============================================================================
// CSV Fixture
// ============================================================================

#[test]
fn test_fixture_rolling_run() {
    let (headers, rows) = load_fixture("station_sample.csv");
    let original = rows.clone();
    let output = imputer(ImputationStrategy::Rolling).impute(rows).unwrap();
    let summary = &output.summary;

    assert_eq!(summary.rows_processed, 20);
    assert_eq!(summary.values_imputed, 9);
    assert_eq!(summary.values_fallback, 3);
    assert_eq!(summary.rejected_observations, 1);
    assert_eq!(summary.text_anomalies, 1);

    let temp = column(&output.rows, "Temp Out");
    assert_eq!(temp[3], "12.0");
    assert_eq!(temp[10], "11.8");
    assert_eq!(temp[15], "11.6");
    assert_eq!(column(&output.rows, "Wind Speed")[5], "1.1");
    assert_eq!(column(&output.rows, "Wind Direction")[7], "225.0");
    assert_eq!(column(&output.rows, "Rain")[7], "0.0");
    assert_eq!(column(&output.rows, "Solar Rad.")[..3].to_vec(), vec!["0.0"; 3]);

    for untouched in ["Date", "Time", "Out Hum", "Hi Dir", "Bar", "Notes"] {
        assert_eq!(column(&output.rows, untouched), column(&original, untouched));
    }

    let solar = summary.column("Solar Rad.").unwrap();
    assert_eq!(solar.sensor, SensorType::Solar);
    assert_eq!(solar.fallback, 3);
    assert_eq!(summary.per_type[&SensorType::Temperature].imputed, 3);

    let out = frame::rows_to_dataframe(&headers, &output.rows).unwrap();
    assert_eq!(out.shape(), (20, 11));
}

#[test]
fn test_fixture_interpolation_run() {
    let (_, rows) = load_fixture("station_sample.csv");
    let output = imputer(ImputationStrategy::Interpolation).impute(rows).unwrap();

    let temp = column(&output.rows, "Temp Out");
    assert_eq!(temp[3], "11.85");
    assert_eq!(column(&output.rows, "Wind Direction")[7], "227.5");
    assert_eq!(column(&output.rows, "Solar Rad.")[..3].to_vec(), vec!["0.0"; 3]);
    assert_eq!(output.summary.values_imputed, 9);
}

#[test]
fn test_fixture_text_column_detected() {
    let (_, rows) = load_fixture("station_sample.csv");
    let profiles = imputer(ImputationStrategy::Rolling).profile(&rows).unwrap();

    for name in ["Notes", "Hi Dir"] {
        let profile = profiles.iter().find(|p| p.name == name).unwrap();
        assert_eq!(profile.kind.as_str(), "text", "{name}");
    }
    let time = profiles.iter().find(|p| p.name == "Time").unwrap();
    assert_eq!(time.sensor, SensorType::Datetime);
}

#[test]
fn test_streaming_session_matches_batch_run() {
    let (headers, rows) = load_fixture("station_sample.csv");
    let engine = imputer(ImputationStrategy::Rolling);
    let batch = engine.impute(rows.clone()).unwrap();

    let mut session = engine.rolling_session(headers).unwrap();
    let streamed: Vec<Row> = rows
        .iter()
        .cloned()
        .map(|row| session.push(row).unwrap())
        .collect();
    let summary = session.finish();

    assert_eq!(streamed, batch.rows);
    assert_eq!(column(&streamed, "Hi Dir")[..3].to_vec(), vec!["SSW", "SSW", "SW"]);
    assert_eq!(column(&streamed, "Notes"), column(&rows, "Notes"));
    assert_eq!(summary.values_imputed, batch.summary.values_imputed);
    assert_eq!(summary.text_anomalies, batch.summary.text_anomalies);
}

#[test]
fn test_profiled_session_matches_batch_run() {
    let (_, rows) = load_fixture("station_sample.csv");
    let engine = imputer(ImputationStrategy::Rolling);
    let batch = engine.impute(rows.clone()).unwrap();

    let mut session = engine
        .rolling_session_with_profiles(engine.profile(&rows).unwrap())
        .unwrap();
    let streamed: Vec<Row> = rows.into_iter().map(|row| session.push(row).unwrap()).collect();

    assert_eq!(streamed, batch.rows);
    assert_eq!(session.finish().values_fallback, batch.summary.values_fallback);
}
