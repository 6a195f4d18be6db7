use deep_forecast::config::PipelineConfig;
use deep_forecast::data::{DataLoader, RawSeriesTable};
use deep_forecast::pipeline::ForecastPipeline;
use deep_forecast::search::SuccessiveHalvingSearch;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Deep Forecast: Windowed Sequence-Model Pipeline");
    println!("===============================================\n");

    // Pass a newest-first CSV path to use real data; otherwise a synthetic
    // random-walk series stands in.
    let table = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading {} ...", path);
            DataLoader::from_csv(&path, "Close/Last")?
        }
        None => {
            println!("No CSV given, generating a synthetic series...");
            synthetic_walk(500, 42)
        }
    };

    println!(
        "Table: {} rows, {} feature columns\n",
        table.len(),
        table.num_features()
    );

    let config = PipelineConfig::new()
        .with_window_length(10)
        .with_horizon_length(1)
        .with_k_folds(5)
        .with_max_search_epochs(20)
        .with_early_stop_patience(3)
        .with_test_fraction(0.2)
        .with_random_seed(42);

    let pipeline = ForecastPipeline::new(&table, config)?;
    println!("Prepared {} supervised samples", pipeline.num_samples());

    let outcome = pipeline.run(&SuccessiveHalvingSearch::new())?;

    println!("\n{}", outcome.summary);

    println!("First holdout predictions vs actuals:");
    for i in 0..outcome.evaluation.predictions.nrows().min(5) {
        println!(
            "  predicted {:.2}, actual {:.2}",
            outcome.evaluation.predictions[[i, 0]],
            outcome.evaluation.actuals[[i, 0]]
        );
    }

    Ok(())
}

/// Random-walk price series with volume, chronological ascending
fn synthetic_walk(n: usize, seed: u64) -> RawSeriesTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = Normal::new(0.05, 1.0).unwrap();
    let volume_noise: Normal<f64> = Normal::new(0.0, 50_000.0).unwrap();

    let mut price = 100.0;
    let mut closes = Vec::with_capacity(n);
    let mut opens = Vec::with_capacity(n);
    let mut volumes = Vec::with_capacity(n);

    for _ in 0..n {
        let open = price;
        price += step.sample(&mut rng);
        opens.push(open);
        closes.push(price);
        volumes.push(1_000_000.0 + volume_noise.sample(&mut rng).abs());
    }

    let mut features = Array2::zeros((n, 2));
    for i in 0..n {
        features[[i, 0]] = opens[i];
        features[[i, 1]] = volumes[i];
    }

    RawSeriesTable::new(
        features,
        vec!["Open".to_string(), "Volume".to_string()],
        Array1::from(closes),
    )
    .expect("synthetic table shapes are consistent")
}
