use crate::api::error::SeqModelResult;
use ndarray::{Array2, ArrayView2, ArrayViewD};
use serde_json::{Map, Value};
use std::fmt;

/// A trainable model as seen by the estimators.
///
/// Inputs arrive batch-first: `[batch, features]` for dense estimators and
/// `[batch, window, features]` for sequence estimators.
pub trait Network: fmt::Debug + Send {
    /// One optimisation step on a single batch, returning the batch loss.
    fn train_on_batch(&mut self, x: ArrayViewD<'_, f32>, y: ArrayView2<'_, f32>)
        -> SeqModelResult<f32>;

    fn predict_on_batch(&self, x: ArrayViewD<'_, f32>) -> SeqModelResult<Array2<f32>>;

    fn parameter_count(&self) -> usize;
}

/// Shapes and options a builder needs to construct a [`Network`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildParams {
    pub n_features: usize,
    pub n_features_out: usize,
    /// Window length; `None` for dense estimators.
    pub lookback_window: Option<usize>,
    /// Every other estimator keyword argument.
    pub kwargs: Map<String, Value>,
}

impl BuildParams {
    /// Number of input values per sample once a window is flattened.
    pub fn flat_input_len(&self) -> usize {
        self.n_features * self.lookback_window.unwrap_or(1)
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.kwargs.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }
}

/// Constructs networks of one architecture.
pub trait ModelBuilder: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn build(&self, params: &BuildParams) -> SeqModelResult<Box<dyn Network>>;
}
