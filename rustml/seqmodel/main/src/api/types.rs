use crate::api::error::SeqModelResult;
use crate::api::network::ModelBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// How an estimator picks its model builder.
#[derive(Clone)]
pub enum Kind {
    /// Looked up in the [`ModelRegistry`](crate::ModelRegistry) under the
    /// estimator's type.
    Named(String),
    /// Used as given.
    Builder(Arc<dyn ModelBuilder>),
}

impl Kind {
    pub fn name(&self) -> &str {
        match self {
            Kind::Named(name) => name,
            Kind::Builder(builder) => builder.name(),
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Kind::Builder(builder) => f.debug_tuple("Builder").field(&builder.name()).finish(),
        }
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Kind::Named(name.to_string())
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Kind::Named(name)
    }
}

impl From<Arc<dyn ModelBuilder>> for Kind {
    fn from(builder: Arc<dyn ModelBuilder>) -> Self {
        Kind::Builder(builder)
    }
}

/// Training loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub verbose: u8,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            epochs: 1,
            batch_size: 32,
            shuffle: true,
            verbose: 0,
        }
    }
}

impl FitParams {
    const KEYS: [&'static str; 4] = ["epochs", "batch_size", "shuffle", "verbose"];

    /// Pick the training settings out of an estimator's keyword arguments,
    /// ignoring everything else.
    pub fn from_kwargs(kwargs: &Map<String, Value>) -> SeqModelResult<Self> {
        let picked: Map<String, Value> = kwargs
            .iter()
            .filter(|(key, _)| Self::KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(serde_json::from_value(Value::Object(picked))?)
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

/// Per-epoch training record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Mean batch loss per epoch.
    pub loss: Vec<f32>,
    pub params: Map<String, Value>,
}

impl History {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "loss": self.loss,
            "params": self.params,
        })
    }
}
