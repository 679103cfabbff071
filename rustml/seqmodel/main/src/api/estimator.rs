use crate::api::error::SeqModelResult;
use ndarray::Array2;
use rustml_tsgen::SeriesData;
use serde_json::{Map, Value};
use std::fmt;

/// Fit/predict surface shared by every model in this crate.
pub trait Estimator: fmt::Debug + Send {
    fn fit(&mut self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<()>;

    /// Model output, possibly shorter than `x` for windowed models.
    fn predict(&self, x: &SeriesData) -> SeqModelResult<Array2<f32>>;

    /// Explained variance between `y` and the prediction for `x`.
    fn score(&self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<f64>;

    fn get_params(&self) -> Map<String, Value>;

    fn get_metadata(&self) -> Map<String, Value>;

    /// How this model is put together, for metadata collection.
    fn composition(&self) -> ComposedModel<'_>;
}

/// A fitted preprocessing step.
pub trait Transformer: fmt::Debug + Send + Sync {
    fn fit(&mut self, x: &Array2<f32>) -> SeqModelResult<()>;

    fn transform(&self, x: &Array2<f32>) -> SeqModelResult<Array2<f32>>;

    fn fit_transform(&mut self, x: &Array2<f32>) -> SeqModelResult<Array2<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Structure of a model as far as metadata is concerned.
#[derive(Debug)]
pub enum ComposedModel<'a> {
    /// Carries no metadata.
    Opaque,
    /// Reports its own metadata.
    Leaf(&'a dyn Estimator),
    /// Reports the metadata of its final step only.
    Pipeline(&'a dyn Estimator),
    /// Reports its own metadata, then that of every submodel in order.
    Wrapper {
        own: Map<String, Value>,
        submodels: Vec<ComposedModel<'a>>,
    },
}
