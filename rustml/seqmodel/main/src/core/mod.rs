pub mod dense;
pub mod linear;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod raw;
pub mod registry;
pub mod scaler;
pub mod sequence;
pub mod training;
