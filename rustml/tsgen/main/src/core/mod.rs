pub mod chunked;
pub mod chunks;
pub mod padding;
pub mod registry;
pub mod step;
pub mod window;
