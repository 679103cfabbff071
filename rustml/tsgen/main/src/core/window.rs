//! Fixed-length sliding-window batch generator.

use crate::api::error::{TsgenError, TsgenResult};
use crate::api::source::BatchSource;
use crate::api::types::Batch;
use ndarray::{s, Array2, Array3, Axis};
use rand::Rng;

/// Slides a window of `length` rows over `data`, pairing each window with
/// the target row right after it.
///
/// Target rows run from `length` to `n - 1`. The window for target row `r`
/// is `data[r - length .. r]`. Consecutive target rows are grouped into
/// batches of `batch_size`; the last batch may be smaller.
///
/// With `shuffle`, every batch instead draws `batch_size` target rows
/// uniformly (with replacement) from the usable range.
#[derive(Debug, Clone)]
pub struct WindowGenerator {
    data: Array2<f32>,
    targets: Array2<f32>,
    length: usize,
    batch_size: usize,
    shuffle: bool,
    start_index: usize,
    end_index: usize,
}

impl WindowGenerator {
    pub fn new(
        data: Array2<f32>,
        targets: Array2<f32>,
        length: usize,
        batch_size: usize,
        shuffle: bool,
    ) -> TsgenResult<Self> {
        if data.nrows() != targets.nrows() {
            return Err(TsgenError::LengthMismatch {
                data: data.nrows(),
                targets: targets.nrows(),
            });
        }
        if length == 0 {
            return Err(TsgenError::InvalidConfig(
                "window length must be at least 1".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(TsgenError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let rows = data.nrows();
        if rows <= length {
            return Err(TsgenError::WindowTooLong { length, rows });
        }

        Ok(Self {
            data,
            targets,
            length,
            batch_size,
            shuffle,
            start_index: length,
            end_index: rows - 1,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Number of windows across all batches.
    pub fn num_windows(&self) -> usize {
        self.end_index + 1 - self.start_index
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn n_targets(&self) -> usize {
        self.targets.ncols()
    }

    /// Target rows that make up batch `index`.
    fn batch_rows(&self, index: usize) -> Vec<usize> {
        if self.shuffle {
            let mut rng = rand::thread_rng();
            (0..self.batch_size)
                .map(|_| rng.gen_range(self.start_index..=self.end_index))
                .collect()
        } else {
            let first = self.start_index + self.batch_size * index;
            let last = (first + self.batch_size).min(self.end_index + 1);
            (first..last).collect()
        }
    }
}

impl BatchSource for WindowGenerator {
    fn len(&self) -> usize {
        (self.end_index - self.start_index + self.batch_size) / self.batch_size
    }

    fn get(&self, index: usize) -> TsgenResult<Batch> {
        let len = self.len();
        if index >= len {
            return Err(TsgenError::IndexOutOfRange { index, len });
        }

        let rows = self.batch_rows(index);
        let mut x = Array3::<f32>::zeros((rows.len(), self.length, self.data.ncols()));
        for (b, &row) in rows.iter().enumerate() {
            x.slice_mut(s![b, .., ..])
                .assign(&self.data.slice(s![row - self.length..row, ..]));
        }
        let y = self.targets.select(Axis(0), &rows);

        Ok(Batch { x, y })
    }
}
