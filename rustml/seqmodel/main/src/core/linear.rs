use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::network::{BuildParams, ModelBuilder, Network};
use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, Axis};

const DEFAULT_LEARNING_RATE: f32 = 0.01;

/// Linear map over the flattened input: y = x @ W^T + b
///
/// Trained with plain SGD on the mean squared error. Weights and bias start
/// at zero so training runs are reproducible.
#[derive(Debug, Clone)]
pub struct LinearNetwork {
    weight: Array2<f32>, // [out_features, in_features]
    bias: Array1<f32>,   // [out_features]
    learning_rate: f32,
}

impl LinearNetwork {
    pub fn new(in_features: usize, out_features: usize, learning_rate: f32) -> Self {
        Self {
            weight: Array2::zeros((out_features, in_features)),
            bias: Array1::zeros(out_features),
            learning_rate,
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// [batch, ...] -> [batch, in_features]
    fn flatten(&self, x: ArrayViewD<'_, f32>) -> SeqModelResult<Array2<f32>> {
        let batch = x.shape().first().copied().unwrap_or(0);
        let width: usize = x.shape().iter().skip(1).product();
        if width != self.in_features() {
            return Err(SeqModelError::Backend(format!(
                "LinearNetwork expects {} input values per sample, got shape {:?}",
                self.in_features(),
                x.shape()
            )));
        }
        x.to_shape((batch, width))
            .map(|flat| flat.into_owned())
            .map_err(|e| SeqModelError::Backend(e.to_string()))
    }

    fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        x.dot(&self.weight.t()) + &self.bias
    }
}

impl Network for LinearNetwork {
    fn train_on_batch(
        &mut self,
        x: ArrayViewD<'_, f32>,
        y: ArrayView2<'_, f32>,
    ) -> SeqModelResult<f32> {
        let x = self.flatten(x)?;
        if y.dim() != (x.nrows(), self.out_features()) {
            return Err(SeqModelError::Backend(format!(
                "Target shape {:?} does not match output shape {:?}",
                y.shape(),
                [x.nrows(), self.out_features()]
            )));
        }
        if x.nrows() == 0 {
            return Ok(0.0);
        }

        let diff = self.forward(&x) - &y;
        let n = diff.len() as f32;
        let loss = diff.iter().map(|d| d * d).sum::<f32>() / n;

        // d(mse)/d(pred) = 2 * (pred - target) / n
        let grad_out = diff * (2.0 / n);
        let grad_weight = grad_out.t().dot(&x);
        let grad_bias = grad_out.sum_axis(Axis(0));

        self.weight.scaled_add(-self.learning_rate, &grad_weight);
        self.bias.scaled_add(-self.learning_rate, &grad_bias);

        Ok(loss)
    }

    fn predict_on_batch(&self, x: ArrayViewD<'_, f32>) -> SeqModelResult<Array2<f32>> {
        let x = self.flatten(x)?;
        Ok(self.forward(&x))
    }

    fn parameter_count(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}

/// Builds a [`LinearNetwork`]; reads `learning_rate` from the kwargs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBuilder;

impl ModelBuilder for LinearBuilder {
    fn name(&self) -> &str {
        "linear"
    }

    fn build(&self, params: &BuildParams) -> SeqModelResult<Box<dyn Network>> {
        let learning_rate = params.get_f32("learning_rate").unwrap_or(DEFAULT_LEARNING_RATE);
        if learning_rate.is_nan() || learning_rate <= 0.0 {
            return Err(SeqModelError::Validation(format!(
                "learning_rate must be positive, got {}",
                learning_rate
            )));
        }
        if params.flat_input_len() == 0 || params.n_features_out == 0 {
            return Err(SeqModelError::Validation(format!(
                "Cannot build a linear model from {} inputs to {} outputs",
                params.flat_input_len(),
                params.n_features_out
            )));
        }
        Ok(Box::new(LinearNetwork::new(
            params.flat_input_len(),
            params.n_features_out,
            learning_rate,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};
    use serde_json::json;

    #[test]
    fn test_zero_init_predicts_zeros() {
        let net = LinearNetwork::new(3, 2, 0.1);
        let out = net.predict_on_batch(Array2::<f32>::ones((4, 3)).view().into_dyn()).unwrap();
        assert_eq!(out, Array2::<f32>::zeros((4, 2)));
        assert_eq!(net.parameter_count(), 8);
    }

    #[test]
    fn test_identity_regression_converges() {
        let mut net = LinearNetwork::new(1, 1, 0.1);
        let x = array![[-1.0f32], [-0.5], [0.0], [0.5], [1.0]];
        let y = x.mapv(|v| 2.0 * v + 1.0);

        let first = net.train_on_batch(x.view().into_dyn(), y.view()).unwrap();
        let mut last = first;
        for _ in 0..300 {
            last = net.train_on_batch(x.view().into_dyn(), y.view()).unwrap();
        }
        assert!(last < first * 0.01, "first={first}, last={last}");

        let out = net.predict_on_batch(array![[0.25f32]].view().into_dyn()).unwrap();
        assert!((out[[0, 0]] - 1.5).abs() < 0.05);
    }

    #[test]
    fn test_windows_are_flattened() {
        let net = LinearNetwork::new(6, 2, 0.1);
        let x = Array3::<f32>::ones((5, 3, 2));
        let out = net.predict_on_batch(x.view().into_dyn()).unwrap();
        assert_eq!(out.dim(), (5, 2));

        let wrong = Array3::<f32>::ones((5, 2, 2));
        assert!(net.predict_on_batch(wrong.view().into_dyn()).is_err());
    }

    #[test]
    fn test_builder_reads_params() {
        let params = BuildParams {
            n_features: 2,
            n_features_out: 2,
            lookback_window: Some(4),
            kwargs: json!({"learning_rate": 0.5}).as_object().cloned().unwrap(),
        };
        let net = LinearBuilder.build(&params).unwrap();
        assert_eq!(net.parameter_count(), 2 * 8 + 2);

        let bad = BuildParams {
            kwargs: json!({"learning_rate": -1.0}).as_object().cloned().unwrap(),
            ..params
        };
        assert!(LinearBuilder.build(&bad).is_err());
    }
}
