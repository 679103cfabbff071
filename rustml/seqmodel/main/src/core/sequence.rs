//! Sequence estimator trained on sliding windows.
//!
//! Fitting happens in two phases. A primer pass over the first few rows
//! discovers the window shape and builds the network; the main pass then
//! trains on every window of the input with shuffling turned off, since
//! the rows are a time series.

use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::estimator::{ComposedModel, Estimator};
use crate::api::network::{BuildParams, ModelBuilder, Network};
use crate::api::types::{FitParams, History, Kind};
use crate::core::metrics::explained_variance_score;
use crate::core::registry::{ModelRegistry, SEQUENCE_ESTIMATOR};
use crate::core::training::{fit_batches, predict_batches};
use ndarray::Array2;
use rustml_tsgen::{BatchSource, GeneratorArgs, GeneratorOptions, GeneratorRegistry, SeriesData};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Batch size used by [`SequenceEstimator::predict`].
pub const PREDICT_BATCH_SIZE: usize = 10000;

fn default_lookahead() -> i64 {
    1
}

fn default_lookback_window() -> usize {
    1
}

fn default_batch_size() -> usize {
    32
}

/// Serialized form of a [`SequenceEstimator`].
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceEstimatorConfig {
    pub kind: String,
    /// Steps between the last input row of a window and its target.
    #[serde(default = "default_lookahead")]
    pub lookahead: i64,
    #[serde(default = "default_lookback_window")]
    pub lookback_window: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Generator strategy, e.g. `{"type": "GordoTimeseriesGenerator"}`.
    #[serde(default)]
    pub timeseries_generator: Option<GeneratorOptions>,
    /// Builder and training keyword arguments.
    #[serde(flatten)]
    pub kwargs: Map<String, Value>,
}

#[derive(Debug)]
pub struct SequenceEstimator {
    kind: String,
    builder: Arc<dyn ModelBuilder>,
    lookahead: usize,
    lookback_window: usize,
    batch_size: usize,
    timeseries_generator: Option<GeneratorOptions>,
    generators: GeneratorRegistry,
    kwargs: Map<String, Value>,
    network: Option<Box<dyn Network>>,
    history: Option<History>,
}

impl SequenceEstimator {
    pub fn new(registry: &ModelRegistry, kind: impl Into<Kind>, lookahead: usize) -> SeqModelResult<Self> {
        let kind = kind.into();
        let builder = registry.resolve(SEQUENCE_ESTIMATOR, &kind)?;
        Ok(Self {
            kind: kind.name().to_string(),
            builder,
            lookahead,
            lookback_window: default_lookback_window(),
            batch_size: default_batch_size(),
            timeseries_generator: None,
            generators: GeneratorRegistry::with_defaults(),
            kwargs: Map::new(),
            network: None,
            history: None,
        })
    }

    /// Predict the row right after each window.
    pub fn forecast(registry: &ModelRegistry, kind: impl Into<Kind>) -> SeqModelResult<Self> {
        Self::new(registry, kind, 1)
    }

    /// Reconstruct the last row of each window.
    pub fn autoencoder(registry: &ModelRegistry, kind: impl Into<Kind>) -> SeqModelResult<Self> {
        Self::new(registry, kind, 0)
    }

    pub fn from_config(registry: &ModelRegistry, config: &Value) -> SeqModelResult<Self> {
        let config = SequenceEstimatorConfig::deserialize(config)?;
        let lookahead = usize::try_from(config.lookahead).map_err(|_| {
            SeqModelError::Validation(format!(
                "Value of `lookahead` can not be negative, is {}",
                config.lookahead
            ))
        })?;
        let mut estimator = Self::new(registry, config.kind, lookahead)?
            .with_lookback_window(config.lookback_window)
            .with_batch_size(config.batch_size);
        estimator.timeseries_generator = config.timeseries_generator;
        estimator.kwargs = config.kwargs;
        Ok(estimator)
    }

    pub fn with_lookback_window(mut self, lookback_window: usize) -> Self {
        self.lookback_window = lookback_window;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeseries_generator(mut self, config: GeneratorOptions) -> Self {
        self.timeseries_generator = Some(config);
        self
    }

    /// Use `generators` instead of the built-in strategies.
    pub fn with_generator_registry(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    pub fn lookback_window(&self) -> usize {
        self.lookback_window
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub fn network(&self) -> Option<&dyn Network> {
        self.network.as_deref()
    }

    fn validate_size(&self, x: &SeriesData) -> SeqModelResult<()> {
        if self.lookback_window >= x.nrows() {
            return Err(SeqModelError::Validation(format!(
                "For SequenceEstimator lookback_window must be < size of X, got lookback_window={} and {} rows",
                self.lookback_window,
                x.nrows()
            )));
        }
        Ok(())
    }

    fn generator(
        &self,
        x: &SeriesData,
        y: &SeriesData,
        batch_size: usize,
    ) -> SeqModelResult<Box<dyn BatchSource>> {
        let args = GeneratorArgs::new(
            x.clone(),
            y.clone(),
            self.lookback_window,
            batch_size,
            self.lookahead as i64,
        );
        Ok(self
            .generators
            .create_from_config(self.timeseries_generator.as_ref(), args)?)
    }

    /// Build the network from the first window of `x_sample`/`y_sample` and
    /// train it on that window alone.
    ///
    /// [`fit`](Estimator::fit) calls this with the first
    /// `lookahead + lookback_window` rows, which hold exactly one window.
    pub fn prime(&mut self, x_sample: &SeriesData, y_sample: &SeriesData) -> SeqModelResult<()> {
        let primer = self.generator(x_sample, y_sample, 1)?.get(0)?;
        let n_features = primer.n_features();
        let n_features_out = primer.y.ncols();
        log::debug!(
            "Priming {} with a window of shape {:?}",
            self.kind,
            primer.x.shape()
        );

        self.kwargs.insert("n_features".to_string(), n_features.into());
        self.kwargs.insert("n_features_out".to_string(), n_features_out.into());

        let params = BuildParams {
            n_features,
            n_features_out,
            lookback_window: Some(self.lookback_window),
            kwargs: self.kwargs.clone(),
        };
        let mut network = self.builder.build(&params)?;
        network.train_on_batch(primer.x.view().into_dyn(), primer.y.view())?;

        self.network = Some(network);
        Ok(())
    }

    fn fitted_network(&self) -> SeqModelResult<&dyn Network> {
        self.network
            .as_deref()
            .ok_or(SeqModelError::NotFitted("SequenceEstimator"))
    }
}

impl Estimator for SequenceEstimator {
    fn fit(&mut self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<()> {
        if x.nrows() != y.nrows() {
            return Err(SeqModelError::Validation(format!(
                "X has {} rows but y has {}",
                x.nrows(),
                y.nrows()
            )));
        }
        self.validate_size(x)?;

        let primer_rows = self.lookahead + self.lookback_window;
        self.prime(&x.head(primer_rows), &y.head(primer_rows))?;

        let source = self.generator(x, y, self.batch_size)?;
        let params = FitParams::from_kwargs(&self.kwargs)?
            .with_batch_size(self.batch_size)
            .with_shuffle(false);
        let network = self
            .network
            .as_deref_mut()
            .ok_or(SeqModelError::NotFitted("SequenceEstimator"))?;
        self.history = Some(fit_batches(network, source.as_ref(), &params)?);
        Ok(())
    }

    /// Windows over `(x, x)`; one row per window.
    fn predict(&self, x: &SeriesData) -> SeqModelResult<Array2<f32>> {
        let network = self.fitted_network()?;
        self.validate_size(x)?;
        let source = self.generator(x, x, PREDICT_BATCH_SIZE)?;
        predict_batches(network, source.as_ref())
    }

    /// Explained variance against the last `len(prediction)` rows of `y`.
    fn score(&self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<f64> {
        self.fitted_network()?;
        let out = self.predict(x)?;
        let y = y.tail(out.nrows());
        explained_variance_score(y.values().view(), out.view())
    }

    fn get_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("kind".to_string(), Value::String(self.kind.clone()));
        params.insert("lookahead".to_string(), self.lookahead.into());
        params.insert("lookback_window".to_string(), self.lookback_window.into());
        params.insert("batch_size".to_string(), self.batch_size.into());
        params.insert(
            "timeseries_generator".to_string(),
            self.timeseries_generator
                .clone()
                .map(Value::Object)
                .unwrap_or(Value::Null),
        );
        params.extend(self.kwargs.clone());
        params
    }

    fn get_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        if let Some(history) = &self.history {
            metadata.insert("history".to_string(), history.to_value());
        }
        metadata.insert("forecast_steps".to_string(), self.lookahead.into());
        metadata
    }

    fn composition(&self) -> ComposedModel<'_> {
        ComposedModel::Leaf(self)
    }
}
