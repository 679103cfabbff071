//! Error types for window generation

use crate::api::types::TimeseriesChunk;
use thiserror::Error;

/// Result type for window generation
pub type TsgenResult<T> = Result<T, TsgenError>;

/// Errors that can occur while building or indexing window generators
#[derive(Error, Debug)]
pub enum TsgenError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Data and targets have to be of same length. Data length is {data} while target length is {targets}"
    )]
    LengthMismatch { data: usize, targets: usize },

    #[error("Data and targets have to share the same time index")]
    IndexMismatch,

    #[error("{0} have to be a time-indexed frame")]
    NotTabular(&'static str),

    #[error("Time index must be sorted and unique, violated at row {position}")]
    UnsortedIndex { position: usize },

    #[error("Window length {length} needs at least {} rows, got {rows}", .length + 1)]
    WindowTooLong { length: usize, rows: usize },

    #[error("{message}. Failed chunks: {}", format_chunks(.failed_chunks))]
    InsufficientData {
        message: String,
        failed_chunks: Vec<TimeseriesChunk>,
    },

    #[error("Unspecified \"type\" attribute for \"timeseries_generator\"")]
    MissingType,

    #[error("Unknown type \"{0}\" for \"timeseries_generator\"")]
    UnknownType(String),

    #[error("TimeseriesGenerator type with name \"{0}\" already exists")]
    DuplicateName(String),

    #[error("Index {index} out of range for generator of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

fn format_chunks(chunks: &[TimeseriesChunk]) -> String {
    let parts: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
