use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::estimator::{ComposedModel, Estimator};
use crate::api::network::{BuildParams, ModelBuilder, Network};
use crate::api::types::{FitParams, History, Kind};
use crate::core::metrics::explained_variance_score;
use crate::core::registry::{ModelRegistry, DENSE_ESTIMATOR};
use crate::core::training::{fit_arrays, predict_arrays};
use ndarray::Array2;
use rustml_tsgen::SeriesData;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Serialized form of a [`DenseEstimator`].
#[derive(Debug, Clone, Deserialize)]
pub struct DenseEstimatorConfig {
    pub kind: String,
    /// Builder and training keyword arguments.
    #[serde(flatten)]
    pub kwargs: Map<String, Value>,
}

/// Row-wise model: every input row maps to one output row.
#[derive(Debug)]
pub struct DenseEstimator {
    kind: String,
    builder: Arc<dyn ModelBuilder>,
    kwargs: Map<String, Value>,
    network: Option<Box<dyn Network>>,
    history: Option<History>,
}

impl DenseEstimator {
    pub fn new(
        registry: &ModelRegistry,
        kind: impl Into<Kind>,
        kwargs: Map<String, Value>,
    ) -> SeqModelResult<Self> {
        let kind = kind.into();
        let builder = registry.resolve(DENSE_ESTIMATOR, &kind)?;
        Ok(Self::with_builder(kind.name().to_string(), builder, kwargs))
    }

    pub(crate) fn with_builder(
        kind: String,
        builder: Arc<dyn ModelBuilder>,
        kwargs: Map<String, Value>,
    ) -> Self {
        Self {
            kind,
            builder,
            kwargs,
            network: None,
            history: None,
        }
    }

    pub fn from_config(registry: &ModelRegistry, config: &Value) -> SeqModelResult<Self> {
        let config = DenseEstimatorConfig::deserialize(config)?;
        Self::new(registry, config.kind, config.kwargs)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub fn network(&self) -> Option<&dyn Network> {
        self.network.as_deref()
    }

    fn fitted_network(&self) -> SeqModelResult<&dyn Network> {
        self.network
            .as_deref()
            .ok_or(SeqModelError::NotFitted("DenseEstimator"))
    }
}

impl Estimator for DenseEstimator {
    fn fit(&mut self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<()> {
        let (x, y) = (x.values(), y.values());
        if x.nrows() != y.nrows() {
            return Err(SeqModelError::Validation(format!(
                "X has {} rows but y has {}",
                x.nrows(),
                y.nrows()
            )));
        }
        log::debug!("Fitting to data of length: {}", x.nrows());

        self.kwargs.insert("n_features".to_string(), x.ncols().into());
        self.kwargs.insert("n_features_out".to_string(), y.ncols().into());

        let params = BuildParams {
            n_features: x.ncols(),
            n_features_out: y.ncols(),
            lookback_window: None,
            kwargs: self.kwargs.clone(),
        };
        let mut network = self.builder.build(&params)?;
        let fit_params = FitParams::from_kwargs(&self.kwargs)?;
        let history = fit_arrays(network.as_mut(), x.view(), y.view(), &fit_params)?;

        self.network = Some(network);
        self.history = Some(history);
        Ok(())
    }

    fn predict(&self, x: &SeriesData) -> SeqModelResult<Array2<f32>> {
        let network = self.fitted_network()?;
        let batch_size = FitParams::from_kwargs(&self.kwargs)?.batch_size;
        predict_arrays(network, x.values().view(), batch_size)
    }

    fn score(&self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<f64> {
        self.fitted_network()?;
        let out = self.predict(x)?;
        explained_variance_score(y.values().view(), out.view())
    }

    fn get_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("kind".to_string(), Value::String(self.kind.clone()));
        params.extend(self.kwargs.clone());
        params
    }

    fn get_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        if let Some(history) = &self.history {
            metadata.insert("history".to_string(), history.to_value());
        }
        metadata
    }

    fn composition(&self) -> ComposedModel<'_> {
        ComposedModel::Leaf(self)
    }
}
