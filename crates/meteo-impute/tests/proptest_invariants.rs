//! Property tests for window bounds, medians and run-level invariants.

use meteo_impute::{ImputationConfig, ImputationStrategy, Imputer, Row, RollingWindow};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn classical_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    })
}

fn run(strategy: ImputationStrategy, header: &str, cells: &[String]) -> (Vec<Row>, usize) {
    let config = ImputationConfig::builder().strategy(strategy).build().unwrap();
    let rows: Vec<Row> = cells
        .iter()
        .map(|cell| [(header, cell.as_str())].into_iter().collect())
        .collect();
    let output = Imputer::builder()
        .config(config)
        .build()
        .unwrap()
        .impute(rows)
        .unwrap();
    (output.rows, output.summary.values_imputed)
}

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => (-50.0f64..50.0).prop_map(|v| format!("{v:.1}")),
        1 => Just(String::new()),
        1 => Just("nan".to_string()),
        1 => Just("-999".to_string()),
        1 => Just("ERR".to_string()),
    ]
}

fn strategy() -> impl Strategy<Value = ImputationStrategy> {
    prop_oneof![
        Just(ImputationStrategy::Rolling),
        Just(ImputationStrategy::Interpolation),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn window_never_exceeds_capacity(
        capacity in 1usize..30,
        values in prop::collection::vec(-100.0f64..100.0, 0..80),
    ) {
        let mut window = RollingWindow::new(capacity);
        for (pushed, value) in values.iter().enumerate() {
            window.push(*value);
            prop_assert!(window.len() <= capacity);
            prop_assert_eq!(window.len(), (pushed + 1).min(capacity));
        }
    }

    #[test]
    fn window_median_matches_classical_median(
        capacity in 1usize..30,
        values in prop::collection::vec(-100.0f64..100.0, 1..80),
    ) {
        let mut window = RollingWindow::new(capacity);
        for value in &values {
            window.push(*value);
        }
        let kept = &values[values.len().saturating_sub(capacity)..];
        prop_assert_eq!(window.median(), classical_median(kept));
    }

    #[test]
    fn complete_columns_are_never_imputed(
        strategy in strategy(),
        values in prop::collection::vec(0.0f64..100.0, 1..60),
    ) {
        let cells: Vec<String> = values.iter().map(|v| format!("{v:.2}")).collect();
        let (rows, imputed) = run(strategy, "Out Hum", &cells);

        prop_assert_eq!(imputed, 0);
        for (row, cell) in rows.iter().zip(&cells) {
            prop_assert_eq!(row.get("Out Hum"), Some(cell.as_str()));
        }
    }

    #[test]
    fn rerun_on_output_is_noop(
        strategy in strategy(),
        cells in prop::collection::vec(cell(), 1..60),
    ) {
        let (first, _) = run(strategy, "Temp Out", &cells);
        let filled: Vec<String> = first
            .iter()
            .map(|row| row.get("Temp Out").unwrap_or_default().to_string())
            .collect();

        let (second, imputed) = run(strategy, "Temp Out", &filled);
        prop_assert_eq!(imputed, 0);
        prop_assert_eq!(second, first);
    }
}
