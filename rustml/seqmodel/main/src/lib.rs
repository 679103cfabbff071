//! # RustML Sequence Models
//!
//! Estimators that train models over fixed-length windows of time series.
//!
//! This crate provides:
//! - A two-phase fit protocol over window generators aware of the
//!   lookahead between the last input row and its target
//! - A dense estimator for plain row-wise models
//! - A model-builder registry keyed by estimator type and builder name
//! - Scoring metrics, a min-max scaler and pipelines of transformers
//! - Metadata collection over composed models
//!
//! ## Example
//!
//! ```rust,ignore
//! use rustml_seqmodel::{Estimator, ModelRegistry, SequenceEstimator};
//!
//! let registry = ModelRegistry::with_defaults();
//! let mut model = SequenceEstimator::forecast(&registry, "linear")?
//!     .with_lookback_window(20)
//!     .with_batch_size(10);
//! model.fit(&x, &x)?;
//! let score = model.score(&x, &x)?;
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
