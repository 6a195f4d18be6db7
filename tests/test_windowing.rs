use deep_forecast::error::ForecastError;
use deep_forecast::windowing::make_sequences;
use ndarray::{Array1, Array2};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Feature matrix where row i holds [i, i + 0.5], target i * 10
fn ramp_table(n: usize) -> (Array2<f64>, Array1<f64>) {
    let features = Array2::from_shape_fn((n, 2), |(i, j)| i as f64 + j as f64 * 0.5);
    let target = Array1::from_shape_fn(n, |i| i as f64 * 10.0);
    (features, target)
}

#[rstest]
#[case(20, 5, 1)]
#[case(20, 5, 3)]
#[case(50, 10, 1)]
#[case(6, 5, 1)]
fn test_sample_count(#[case] n: usize, #[case] window: usize, #[case] horizon: usize) {
    let (features, target) = ramp_table(n);

    let (inputs, outputs) = make_sequences(&features, &target, window, horizon).unwrap();

    let expected = n - window - horizon + 1;
    assert_eq!(inputs.shape(), &[expected, window, 2]);
    assert_eq!(outputs.shape(), &[expected, horizon]);
}

#[test]
fn test_no_off_by_one_drift() {
    let (features, target) = ramp_table(30);
    let window = 7;
    let horizon = 2;

    let (inputs, outputs) = make_sequences(&features, &target, window, horizon).unwrap();

    for i in 0..inputs.shape()[0] {
        // Input covers feature rows [i, i + window)
        assert_eq!(inputs[[i, 0, 0]], features[[i, 0]]);
        assert_eq!(inputs[[i, window - 1, 0]], features[[i + window - 1, 0]]);
        // Horizon starts immediately after the window ends
        assert_eq!(outputs[[i, 0]], target[i + window]);
        assert_eq!(outputs[[i, 1]], target[i + window + 1]);
    }
}

#[test]
fn test_twenty_row_scenario() {
    // 20 chronological rows, 2 features, window 5, horizon 1 -> 16 samples
    let (features, target) = ramp_table(20);

    let (inputs, outputs) = make_sequences(&features, &target, 5, 1).unwrap();

    assert_eq!(inputs.shape()[0], 16);
    assert_eq!(outputs[[0, 0]], target[5]);
}

#[test]
fn test_exact_fit_yields_single_sample() {
    let (features, target) = ramp_table(6);

    let (inputs, outputs) = make_sequences(&features, &target, 5, 1).unwrap();

    assert_eq!(inputs.shape()[0], 1);
    assert_eq!(outputs[[0, 0]], target[5]);
}

#[test]
fn test_insufficient_data_is_signaled() {
    let (features, target) = ramp_table(5);

    let result = make_sequences(&features, &target, 5, 1);

    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_length_mismatch_is_rejected() {
    let (features, _) = ramp_table(20);
    let short_target = Array1::zeros(19);

    let result = make_sequences(&features, &short_target, 5, 1);

    assert!(matches!(result, Err(ForecastError::ShapeMismatch(_))));
}

#[test]
fn test_windowing_is_deterministic() {
    let (features, target) = ramp_table(25);

    let first = make_sequences(&features, &target, 6, 2).unwrap();
    let second = make_sequences(&features, &target, 6, 2).unwrap();

    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
}
