// SAF (Simple API Facade): re-exports for convenient access

// API traits and types
pub use crate::api::error::{SeqModelError, SeqModelResult};
pub use crate::api::estimator::{ComposedModel, Estimator, Transformer};
pub use crate::api::network::{BuildParams, ModelBuilder, Network};
pub use crate::api::types::{FitParams, History, Kind};

// Model builders
pub use crate::core::linear::{LinearBuilder, LinearNetwork};
pub use crate::core::registry::{ModelRegistry, DENSE_ESTIMATOR, SEQUENCE_ESTIMATOR};

// Estimators
pub use crate::core::dense::{DenseEstimator, DenseEstimatorConfig};
pub use crate::core::raw::RawModelRegressor;
pub use crate::core::sequence::{SequenceEstimator, SequenceEstimatorConfig, PREDICT_BATCH_SIZE};

// Training
pub use crate::core::training::{fit_arrays, fit_batches, predict_arrays, predict_batches};

// Metrics
pub use crate::core::metrics::{
    explained_variance_score, mean_absolute_error, mean_squared_error, metric_wrapper, r2_score,
    Metric,
};

// Preprocessing and composition
pub use crate::core::metadata::{determine_offset, extract_metadata};
pub use crate::core::pipeline::{Pipeline, PipelineStep};
pub use crate::core::scaler::MinMaxScaler;
