pub mod error;
pub mod estimator;
pub mod network;
pub mod types;
