use crate::api::error::TsgenResult;
use crate::api::types::Batch;
use std::fmt;

/// Random-access sequence of batches.
///
/// `get(i)` must succeed for every `i < len()` and fail with
/// `IndexOutOfRange` otherwise.
pub trait BatchSource: fmt::Debug {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> TsgenResult<Batch>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
