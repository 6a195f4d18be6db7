use deep_forecast::data::{DataLoader, RawSeriesTable};
use deep_forecast::error::ForecastError;
use ndarray::{array, Array1};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

/// Newest-first CSV in the shape daily price exports arrive in
fn write_newest_first_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,Volume,Close/Last").unwrap();
    writeln!(file, "2023-01-05,105.0,5000,106.0").unwrap();
    writeln!(file, "2023-01-04,104.0,4000,105.0").unwrap();
    writeln!(file, "2023-01-03,103.0,3000,104.0").unwrap();
    writeln!(file, "2023-01-02,102.0,2000,103.0").unwrap();
    writeln!(file, "2023-01-01,101.0,1000,102.0").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_csv_rows_are_reversed_to_chronological() {
    let file = write_newest_first_csv();

    let table = DataLoader::from_csv(file.path(), "Close/Last").unwrap();

    assert_eq!(table.len(), 5);
    // Oldest row first after loading
    assert_eq!(table.features()[[0, 0]], 101.0);
    assert_eq!(table.features()[[4, 0]], 105.0);
    assert_eq!(table.target()[0], 102.0);
    assert_eq!(table.target()[4], 106.0);
}

#[test]
fn test_target_column_is_excluded_from_features() {
    let file = write_newest_first_csv();

    let table = DataLoader::from_csv(file.path(), "Close/Last").unwrap();

    assert_eq!(table.num_features(), 2);
    assert!(!table
        .feature_names()
        .iter()
        .any(|name| name == "Close/Last"));
    assert!(table.feature_names().iter().any(|name| name == "Open"));
    assert!(table.feature_names().iter().any(|name| name == "Volume"));
}

#[test]
fn test_date_column_is_dropped() {
    let file = write_newest_first_csv();

    let table = DataLoader::from_csv(file.path(), "Close/Last").unwrap();

    assert!(!table.feature_names().iter().any(|name| name == "Date"));
}

#[test]
fn test_out_of_order_dates_are_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,Close/Last").unwrap();
    writeln!(file, "2023-01-05,105.0,106.0").unwrap();
    writeln!(file, "2023-01-02,102.0,103.0").unwrap();
    writeln!(file, "2023-01-03,103.0,104.0").unwrap();
    file.flush().unwrap();

    let result = DataLoader::from_csv(file.path(), "Close/Last");

    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_missing_target_column_errors() {
    let file = write_newest_first_csv();

    let result = DataLoader::from_csv(file.path(), "Adj Close");

    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_table_rejects_length_mismatch() {
    let features = array![[1.0, 2.0], [3.0, 4.0]];
    let target: Array1<f64> = array![1.0, 2.0, 3.0];

    let result = RawSeriesTable::new(
        features,
        vec!["a".to_string(), "b".to_string()],
        target,
    );

    assert!(matches!(result, Err(ForecastError::ShapeMismatch(_))));
}

#[test]
fn test_table_rejects_name_count_mismatch() {
    let features = array![[1.0, 2.0], [3.0, 4.0]];
    let target: Array1<f64> = array![1.0, 2.0];

    let result = RawSeriesTable::new(features, vec!["a".to_string()], target);

    assert!(matches!(result, Err(ForecastError::ShapeMismatch(_))));
}
