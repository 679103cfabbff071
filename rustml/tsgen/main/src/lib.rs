//! # RustML Timeseries Generators
//!
//! Window generators that turn time-indexed sensor data into fixed-length
//! `(input, target)` batches for sequence models.
//!
//! This crate provides:
//! - Detection of contiguous chunks in a time index sampled at a fixed step
//! - Lookahead alignment between input windows and their targets
//! - A plain sliding-window generator and a chunk-aware generator that
//!   never lets a window cross a gap
//! - A registry that selects the generator strategy from configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use rustml_tsgen::{GeneratorArgs, GeneratorRegistry, SeriesData};
//!
//! let registry = GeneratorRegistry::with_defaults();
//! let config = serde_json::json!({"type": "GordoTimeseriesGenerator", "step": "10min"});
//! let generator = registry.create_from_config(
//!     config.as_object(),
//!     GeneratorArgs::new(frame.clone().into(), frame.into(), 20, 10, 0),
//! )?;
//! let batch = generator.get(0)?;
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
