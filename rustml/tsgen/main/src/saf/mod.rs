// SAF (Simple API Facade): re-exports for convenient access

// API types and traits
pub use crate::api::error::{TsgenError, TsgenResult};
pub use crate::api::source::BatchSource;
pub use crate::api::types::{Batch, SeriesData, TimeFrame, TimeseriesChunk};

// Index utilities
pub use crate::core::chunks::find_consecutive_chunks;
pub use crate::core::padding::pad_x_and_y;
pub use crate::core::step::{parse_step, DEFAULT_STEP};

// Generators
pub use crate::core::chunked::{ChunkedSettings, ChunkedTimeseriesGenerator, GeneratorContainer};
pub use crate::core::window::WindowGenerator;

// Strategy selection
pub use crate::core::registry::{
    chunked_generator, default_generator, parse_options, GeneratorArgs, GeneratorCtor,
    GeneratorOptions, GeneratorRegistry, CHUNKED_GENERATOR,
};
