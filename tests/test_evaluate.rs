use assert_approx_eq::assert_approx_eq;
use deep_forecast::error::ForecastError;
use deep_forecast::evaluate::{rmse, train_test_split, FinalEvaluator};
use deep_forecast::model::{HyperparameterProposal, ModelFactory};
use deep_forecast::scaling::MinMaxScaler;
use ndarray::{array, Array2, Array3};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn indexed_samples(n: usize) -> (Array3<f64>, Array2<f64>) {
    // Each sample's values encode its index, so splits can be traced back
    let inputs = Array3::from_shape_fn((n, 4, 2), |(i, _, _)| i as f64);
    let outputs = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
    (inputs, outputs)
}

#[test]
fn test_rmse_is_zero_iff_equal() {
    let actual = array![[1.0, 2.0], [3.0, 4.0]];

    assert_eq!(rmse(&actual, &actual).unwrap(), 0.0);

    let mut off = actual.clone();
    off[[1, 1]] += 0.1;
    assert!(rmse(&off, &actual).unwrap() > 0.0);
}

#[test]
fn test_rmse_known_value() {
    let predictions = array![[2.0], [4.0]];
    let actuals = array![[0.0], [0.0]];

    // sqrt((4 + 16) / 2) = sqrt(10)
    assert_approx_eq!(rmse(&predictions, &actuals).unwrap(), 10.0_f64.sqrt(), 1e-12);
}

#[test]
fn test_rmse_rejects_shape_mismatch() {
    let predictions = array![[1.0], [2.0]];
    let actuals = array![[1.0, 2.0]];

    assert!(matches!(
        rmse(&predictions, &actuals),
        Err(ForecastError::ShapeMismatch(_))
    ));
}

#[test]
fn test_split_fraction_of_hundred() {
    let (inputs, outputs) = indexed_samples(100);

    let (train_x, train_y, test_x, test_y) =
        train_test_split(&inputs, &outputs, 0.2, 42).unwrap();

    assert_eq!(test_x.shape()[0], 20);
    assert_eq!(train_x.shape()[0], 80);
    assert_eq!(test_y.shape()[0], 20);
    assert_eq!(train_y.shape()[0], 80);
}

#[rstest]
// round(n * fraction), rounding half away from zero
#[case(7, 0.5, 4)]
#[case(10, 0.25, 3)]
#[case(9, 0.5, 5)]
#[case(100, 0.33, 33)]
fn test_split_rounding_rule(#[case] n: usize, #[case] fraction: f64, #[case] expected: usize) {
    let (inputs, outputs) = indexed_samples(n);

    let (_, _, test_x, _) = train_test_split(&inputs, &outputs, fraction, 0).unwrap();

    assert_eq!(test_x.shape()[0], expected);
}

#[test]
fn test_split_partitions_without_overlap() {
    let (inputs, outputs) = indexed_samples(50);

    let (train_x, _, test_x, _) = train_test_split(&inputs, &outputs, 0.3, 7).unwrap();

    let mut seen: Vec<usize> = train_x
        .outer_iter()
        .chain(test_x.outer_iter())
        .map(|sample| sample[[0, 0]] as usize)
        .collect();
    seen.sort_unstable();

    assert_eq!(seen, (0..50).collect::<Vec<usize>>());
}

#[test]
fn test_split_is_deterministic_for_seed() {
    let (inputs, outputs) = indexed_samples(40);

    let first = train_test_split(&inputs, &outputs, 0.2, 11).unwrap();
    let second = train_test_split(&inputs, &outputs, 0.2, 11).unwrap();

    assert_eq!(first.2, second.2);
}

#[test]
fn test_degenerate_split_is_empty_test_set() {
    let (inputs, outputs) = indexed_samples(10);

    // 10 * 0.01 rounds to zero test rows
    let result = train_test_split(&inputs, &outputs, 0.01, 42);

    assert!(matches!(result, Err(ForecastError::EmptyTestSet(_))));
}

#[test]
fn test_split_must_leave_training_rows() {
    let (inputs, outputs) = indexed_samples(10);

    let result = train_test_split(&inputs, &outputs, 0.99, 42);

    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_refit_rejects_tiny_training_portion() {
    // round(2 * 0.2) = 0 monitoring rows, so the refit cannot carve its
    // internal split even though the actual test set is fine
    let (train_x, train_y) = indexed_samples(2);
    let (test_x, test_y) = indexed_samples(3);

    let scaler = MinMaxScaler::fit_column(&array![0.0, 1.0, 2.0]).unwrap();
    let mut model = ModelFactory::new(4, 2, 1, 42).build(HyperparameterProposal::new(4, 4));
    let evaluator = FinalEvaluator::new(2, 42);

    let result = evaluator.evaluate(&mut model, &train_x, &train_y, &test_x, &test_y, &scaler);

    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_split_rejects_mismatched_lengths() {
    let (inputs, _) = indexed_samples(10);
    let outputs = Array2::zeros((9, 1));

    let result = train_test_split(&inputs, &outputs, 0.2, 42);

    assert!(matches!(result, Err(ForecastError::ShapeMismatch(_))));
}
