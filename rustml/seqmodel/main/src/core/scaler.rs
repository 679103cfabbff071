use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::estimator::Transformer;
use ndarray::{Array1, Array2, Axis};

/// Per-column min-max scaling into `feature_range`.
///
/// Constant columns get a range of 1 so they map onto the lower bound
/// instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    feature_range: (f32, f32),
    min: Option<Array1<f32>>,
    range: Option<Array1<f32>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            feature_range: (0.0, 1.0),
            min: None,
            range: None,
        }
    }

    pub fn with_feature_range(mut self, low: f32, high: f32) -> Self {
        self.feature_range = (low, high);
        self
    }

    pub fn feature_range(&self) -> (f32, f32) {
        self.feature_range
    }

    pub fn is_fitted(&self) -> bool {
        self.min.is_some()
    }

    fn fitted(&self, x: &Array2<f32>) -> SeqModelResult<(&Array1<f32>, &Array1<f32>)> {
        let (Some(min), Some(range)) = (&self.min, &self.range) else {
            return Err(SeqModelError::NotFitted("MinMaxScaler"));
        };
        if x.ncols() != min.len() {
            return Err(SeqModelError::Validation(format!(
                "MinMaxScaler was fitted on {} columns, got {}",
                min.len(),
                x.ncols()
            )));
        }
        Ok((min, range))
    }

    pub fn inverse_transform(&self, x: &Array2<f32>) -> SeqModelResult<Array2<f32>> {
        let (min, range) = self.fitted(x)?;
        let (low, high) = self.feature_range;
        Ok((x - low) / (high - low) * range + min)
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for MinMaxScaler {
    fn fit(&mut self, x: &Array2<f32>) -> SeqModelResult<()> {
        let (low, high) = self.feature_range;
        if low >= high {
            return Err(SeqModelError::Validation(format!(
                "Minimum of desired feature range must be smaller than maximum, got ({}, {})",
                low, high
            )));
        }
        if x.nrows() == 0 {
            return Err(SeqModelError::Validation(
                "MinMaxScaler needs at least one row to fit".to_string(),
            ));
        }

        let min = x.fold_axis(Axis(0), f32::INFINITY, |&acc, &v| acc.min(v));
        let max = x.fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &v| acc.max(v));
        let range = (&max - &min).mapv(|r| if r == 0.0 { 1.0 } else { r });
        self.min = Some(min);
        self.range = Some(range);
        Ok(())
    }

    fn transform(&self, x: &Array2<f32>) -> SeqModelResult<Array2<f32>> {
        let (min, range) = self.fitted(x)?;
        let (low, high) = self.feature_range;
        Ok((x - min) / range * (high - low) + low)
    }
}
