//! Data types shared by all window generators

use crate::api::error::{TsgenError, TsgenResult};
use chrono::{DateTime, TimeDelta, Utc};
use ndarray::{s, Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A table of samples indexed by timestamp.
///
/// Rows are samples and columns are features. The index carries one
/// timestamp per row.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrame {
    index: Vec<DateTime<Utc>>,
    values: Array2<f32>,
}

impl TimeFrame {
    pub fn new(index: Vec<DateTime<Utc>>, values: Array2<f32>) -> TsgenResult<Self> {
        if index.len() != values.nrows() {
            return Err(TsgenError::LengthMismatch {
                data: values.nrows(),
                targets: index.len(),
            });
        }
        Ok(Self { index, values })
    }

    /// Build a frame whose rows are spaced exactly `step` apart from `start`.
    pub fn regular(start: DateTime<Utc>, step: TimeDelta, values: Array2<f32>) -> Self {
        let index = (0..values.nrows())
            .map(|i| start + step * i as i32)
            .collect();
        Self { index, values }
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f32> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Copy of the rows in `rows`, index included.
    pub fn slice_rows(&self, rows: Range<usize>) -> Self {
        Self {
            index: self.index[rows.clone()].to_vec(),
            values: self.values.slice(s![rows, ..]).to_owned(),
        }
    }

    /// Replace the values while keeping the index.
    pub fn with_values(&self, values: Array2<f32>) -> TsgenResult<Self> {
        Self::new(self.index.clone(), values)
    }

    /// Check that the index is strictly increasing.
    ///
    /// Range lookups by timestamp are only meaningful on such an index.
    pub fn validate_index(&self) -> TsgenResult<()> {
        match self.index.windows(2).position(|w| w[1] <= w[0]) {
            Some(i) => Err(TsgenError::UnsortedIndex { position: i + 1 }),
            None => Ok(()),
        }
    }

    /// Row positions whose timestamp lies in `[start, end]`.
    pub fn positions_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Range<usize> {
        let lo = self.index.partition_point(|ts| *ts < start);
        let hi = self.index.partition_point(|ts| *ts <= end);
        lo..hi.max(lo)
    }
}

/// Input or target data handed to a generator.
///
/// Plain arrays only have positional rows; frames also carry a time index,
/// which the chunk-aware strategy needs.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Array(Array2<f32>),
    Frame(TimeFrame),
}

impl SeriesData {
    /// Turn a single series into an `n x 1` matrix.
    pub fn from_column(column: Array1<f32>) -> Self {
        let n = column.len();
        log::info!("Reshaping X from an array to an matrix of shape ({}, 1)", n);
        SeriesData::Array(column.insert_axis(Axis(1)))
    }

    pub fn values(&self) -> &Array2<f32> {
        match self {
            SeriesData::Array(values) => values,
            SeriesData::Frame(frame) => frame.values(),
        }
    }

    pub fn into_values(self) -> Array2<f32> {
        match self {
            SeriesData::Array(values) => values,
            SeriesData::Frame(frame) => frame.into_values(),
        }
    }

    pub fn as_frame(&self) -> Option<&TimeFrame> {
        match self {
            SeriesData::Frame(frame) => Some(frame),
            SeriesData::Array(_) => None,
        }
    }

    pub fn nrows(&self) -> usize {
        self.values().nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values().ncols()
    }

    /// The first `n` rows (or all of them when shorter).
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.nrows());
        match self {
            SeriesData::Array(values) => SeriesData::Array(values.slice(s![..n, ..]).to_owned()),
            SeriesData::Frame(frame) => SeriesData::Frame(frame.slice_rows(0..n)),
        }
    }

    /// The last `n` rows (or all of them when shorter).
    pub fn tail(&self, n: usize) -> Self {
        let rows = self.nrows();
        let start = rows - n.min(rows);
        match self {
            SeriesData::Array(values) => {
                SeriesData::Array(values.slice(s![start.., ..]).to_owned())
            }
            SeriesData::Frame(frame) => SeriesData::Frame(frame.slice_rows(start..rows)),
        }
    }

    /// Same shape of container with new values, e.g. after scaling.
    pub fn map_values(&self, values: Array2<f32>) -> TsgenResult<Self> {
        match self {
            SeriesData::Array(_) => Ok(SeriesData::Array(values)),
            SeriesData::Frame(frame) => Ok(SeriesData::Frame(frame.with_values(values)?)),
        }
    }
}

impl From<Array2<f32>> for SeriesData {
    fn from(values: Array2<f32>) -> Self {
        SeriesData::Array(values)
    }
}

impl From<TimeFrame> for SeriesData {
    fn from(frame: TimeFrame) -> Self {
        SeriesData::Frame(frame)
    }
}

/// One maximal run of rows spaced exactly one step apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesChunk {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub size: usize,
}

impl fmt::Display for TimeseriesChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} ({} rows)",
            self.start.to_rfc3339(),
            self.end.to_rfc3339(),
            self.size
        )
    }
}

/// A batch of windows and their targets.
///
/// - `x`: `[batch, window_length, n_features]`
/// - `y`: `[batch, n_targets]`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub x: Array3<f32>,
    pub y: Array2<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.x.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window_length(&self) -> usize {
        self.x.shape()[1]
    }

    pub fn n_features(&self) -> usize {
        self.x.shape()[2]
    }
}
