use ndarray::{Array2, ArrayView2, ArrayViewD, Axis, Ix2};
use rustml_seqmodel::*;
use rustml_tsgen::{SeriesData, TimeFrame, CHUNKED_GENERATOR};
use std::sync::{Arc, Mutex};

/// Predicts the last row of every window and records the batch shapes
/// it is trained on.
#[derive(Debug)]
struct PersistenceNetwork {
    seen: Arc<Mutex<Vec<Vec<usize>>>>,
}

impl Network for PersistenceNetwork {
    fn train_on_batch(&mut self, x: ArrayViewD<'_, f32>, y: ArrayView2<'_, f32>) -> SeqModelResult<f32> {
        self.seen.lock().unwrap().push(x.shape().to_vec());
        let out = self.predict_on_batch(x)?;
        Ok((&out - &y).mapv(|d| d * d).mean().unwrap_or(0.0))
    }

    fn predict_on_batch(&self, x: ArrayViewD<'_, f32>) -> SeqModelResult<Array2<f32>> {
        let steps = x.shape()[1];
        x.index_axis(Axis(1), steps - 1)
            .to_owned()
            .into_dimensionality::<Ix2>()
            .map_err(|e| SeqModelError::Backend(e.to_string()))
    }

    fn parameter_count(&self) -> usize {
        0
    }
}

#[derive(Debug, Default)]
struct PersistenceBuilder {
    seen: Arc<Mutex<Vec<Vec<usize>>>>,
    built: Mutex<Vec<BuildParams>>,
}

impl ModelBuilder for PersistenceBuilder {
    fn name(&self) -> &str {
        "persistence"
    }

    fn build(&self, params: &BuildParams) -> SeqModelResult<Box<dyn Network>> {
        self.built.lock().unwrap().push(params.clone());
        Ok(Box::new(PersistenceNetwork {
            seen: self.seen.clone(),
        }))
    }
}

fn ramp(n: usize) -> SeriesData {
    Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f32).into()
}

fn persistence() -> Arc<PersistenceBuilder> {
    Arc::new(PersistenceBuilder::default())
}

#[test]
fn test_two_phase_fit() {
    let builder = persistence();
    let registry = ModelRegistry::new();
    let mut model = SequenceEstimator::autoencoder(&registry, Kind::Builder(builder.clone()))
        .unwrap()
        .with_lookback_window(20)
        .with_batch_size(10);
    model.fit(&ramp(100), &ramp(100)).unwrap();

    let seen = builder.seen.lock().unwrap();
    // Primer: one window of one sample
    assert_eq!(seen[0], vec![1, 20, 2]);
    // Main phase: 101 padded rows => 81 windows => 9 batches
    assert_eq!(seen.len(), 1 + 9);
    assert_eq!(seen[1], vec![10, 20, 2]);
    assert_eq!(seen[9], vec![1, 20, 2]);

    let built = builder.built.lock().unwrap();
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].n_features, 2);
    assert_eq!(built[0].n_features_out, 2);
    assert_eq!(built[0].lookback_window, Some(20));
    assert!(!registry.contains(SEQUENCE_ESTIMATOR, "persistence"));
}

#[test]
fn test_autoencoder_target_is_last_window_row() {
    let registry = ModelRegistry::new();
    let mut model = SequenceEstimator::autoencoder(&registry, Kind::Builder(persistence()))
        .unwrap()
        .with_lookback_window(4);
    let x = ramp(30);
    model.fit(&x, &x).unwrap();

    let out = model.predict(&x).unwrap();
    assert_eq!(out.nrows(), 27);
    assert_eq!(out.row(0).to_vec(), vec![6.0, 7.0]);
    assert!((model.score(&x, &x).unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(model.get_metadata()["forecast_steps"], 0);
}

#[test]
fn test_forecast_scores_against_next_rows() {
    let registry = ModelRegistry::new();
    let mut model = SequenceEstimator::forecast(&registry, Kind::Builder(persistence()))
        .unwrap()
        .with_lookback_window(4);
    let x = ramp(30);
    model.fit(&x, &x).unwrap();

    let out = model.predict(&x).unwrap();
    assert_eq!(out.nrows(), 26);
    let offset = determine_offset(&model, &x).unwrap();
    assert_eq!(offset, 4);

    // Persistence lags a linear ramp by one step: constant residual
    let tail = x.tail(out.nrows());
    assert_eq!(tail.values()[[0, 0]] - out[[0, 0]], 2.0);
    assert!((model.score(&x, &x).unwrap() - 1.0).abs() < 1e-9);
    let mse = metric_wrapper(mean_squared_error, None)(x.values().view(), out.view()).unwrap();
    assert!((mse - 4.0).abs() < 1e-9);
}

#[test]
fn test_longer_lookahead_primes_on_enough_rows() {
    let builder = persistence();
    let registry = ModelRegistry::new();
    let mut model = SequenceEstimator::new(&registry, Kind::Builder(builder.clone()), 3)
        .unwrap()
        .with_lookback_window(5)
        .with_batch_size(100);
    let x = ramp(40);
    model.fit(&x, &x).unwrap();

    assert_eq!(builder.seen.lock().unwrap()[0], vec![1, 5, 2]);
    // 40 + 1 - 3 rows => 33 windows
    assert_eq!(model.predict(&x).unwrap().nrows(), 33);
}

#[test]
fn test_chunked_fit_from_config() {
    let registry = ModelRegistry::with_defaults();
    let config = serde_json::json!({
        "kind": "linear",
        "lookback_window": 3,
        "batch_size": 4,
        "epochs": 2,
        "timeseries_generator": {"type": CHUNKED_GENERATOR, "step": "1min"},
    });
    let mut model = SequenceEstimator::from_config(&registry, &config).unwrap();

    let start = chrono::DateTime::from_timestamp(1_600_000_000, 0).unwrap();
    let mut index: Vec<_> = (0..12).map(|i| start + chrono::TimeDelta::minutes(i)).collect();
    index.extend((0..8).map(|i| start + chrono::TimeDelta::hours(2) + chrono::TimeDelta::minutes(i)));
    let values = Array2::from_shape_fn((20, 2), |(i, j)| ((i + j) % 4) as f32 / 4.0);
    let x: SeriesData = TimeFrame::new(index, values).unwrap().into();

    model.fit(&x, &x).unwrap();
    // 9 + 5 windows, never one across the two-hour gap
    assert_eq!(model.predict(&x).unwrap().nrows(), 14);
    let metadata = model.get_metadata();
    assert_eq!(metadata["history"]["loss"].as_array().unwrap().len(), 2);
    // 3 batches for the first chunk, 2 for the second
    assert_eq!(metadata["history"]["params"]["steps"], 5);
}

#[test]
fn test_generator_errors_surface() {
    let registry = ModelRegistry::with_defaults();
    let mut model = SequenceEstimator::forecast(&registry, "linear")
        .unwrap()
        .with_lookback_window(3)
        .with_timeseries_generator(
            serde_json::json!({"type": CHUNKED_GENERATOR})
                .as_object()
                .cloned()
                .unwrap(),
        );
    let err = model.fit(&ramp(20), &ramp(20)).unwrap_err();
    assert!(matches!(err, SeqModelError::Timeseries(_)));

    let mut model = SequenceEstimator::forecast(&registry, "linear")
        .unwrap()
        .with_timeseries_generator(
            serde_json::json!({"type": "Unknown"}).as_object().cloned().unwrap(),
        );
    assert!(model.fit(&ramp(20), &ramp(20)).unwrap_err().to_string().contains("Unknown"));
}

#[test]
fn test_dense_and_pipeline_metadata() {
    let registry = ModelRegistry::with_defaults();
    let dense = DenseEstimator::new(&registry, "linear", Default::default()).unwrap();
    let mut pipeline = Pipeline::new("dense", Box::new(dense))
        .with_step("minmax", Box::new(MinMaxScaler::new()));

    let x = ramp(12);
    pipeline.fit(&x, &x).unwrap();
    assert_eq!(determine_offset(&pipeline, &x).unwrap(), 0);
    assert!(extract_metadata(&pipeline.composition()).contains_key("history"));
}
