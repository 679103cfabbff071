//! Regression metrics over `[samples, outputs]` arrays.
//!
//! Multi-output scores are the uniform average over output columns.

use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::estimator::Transformer;
use ndarray::{ArrayView1, ArrayView2, Axis};
use std::sync::Arc;

pub type Metric = fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>) -> SeqModelResult<f64>;

fn check_shapes(y_true: &ArrayView2<'_, f32>, y_pred: &ArrayView2<'_, f32>) -> SeqModelResult<()> {
    if y_true.dim() != y_pred.dim() {
        return Err(SeqModelError::Validation(format!(
            "y_true and y_pred have different shapes: {:?} vs {:?}",
            y_true.shape(),
            y_pred.shape()
        )));
    }
    if y_true.is_empty() {
        return Err(SeqModelError::Validation(
            "Cannot score an empty prediction".to_string(),
        ));
    }
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    sum / count as f64
}

fn variance(column: &[f64]) -> f64 {
    let m = mean(column.iter().copied());
    mean(column.iter().map(|v| (v - m).powi(2)))
}

/// `1 - numerator / denominator`, with a constant target scoring 1.0 when
/// predicted exactly and 0.0 otherwise.
fn ratio_score(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - numerator / denominator
    }
}

fn per_output<F>(y_true: ArrayView2<'_, f32>, y_pred: ArrayView2<'_, f32>, score: F) -> f64
where
    F: Fn(ArrayView1<'_, f32>, ArrayView1<'_, f32>) -> f64,
{
    mean(
        y_true
            .axis_iter(Axis(1))
            .zip(y_pred.axis_iter(Axis(1)))
            .map(|(t, p)| score(t, p)),
    )
}

pub fn explained_variance_score(
    y_true: ArrayView2<'_, f32>,
    y_pred: ArrayView2<'_, f32>,
) -> SeqModelResult<f64> {
    check_shapes(&y_true, &y_pred)?;
    Ok(per_output(y_true, y_pred, |t, p| {
        let residual: Vec<f64> = t.iter().zip(p.iter()).map(|(&a, &b)| (a - b) as f64).collect();
        let truth: Vec<f64> = t.iter().map(|&a| a as f64).collect();
        ratio_score(variance(&residual), variance(&truth))
    }))
}

pub fn r2_score(y_true: ArrayView2<'_, f32>, y_pred: ArrayView2<'_, f32>) -> SeqModelResult<f64> {
    check_shapes(&y_true, &y_pred)?;
    Ok(per_output(y_true, y_pred, |t, p| {
        let truth: Vec<f64> = t.iter().map(|&a| a as f64).collect();
        let m = mean(truth.iter().copied());
        let ss_res: f64 = t.iter().zip(p.iter()).map(|(&a, &b)| ((a - b) as f64).powi(2)).sum();
        let ss_tot: f64 = truth.iter().map(|v| (v - m).powi(2)).sum();
        ratio_score(ss_res, ss_tot)
    }))
}

pub fn mean_squared_error(
    y_true: ArrayView2<'_, f32>,
    y_pred: ArrayView2<'_, f32>,
) -> SeqModelResult<f64> {
    check_shapes(&y_true, &y_pred)?;
    Ok(mean(y_true.iter().zip(y_pred.iter()).map(|(&a, &b)| ((a - b) as f64).powi(2))))
}

pub fn mean_absolute_error(
    y_true: ArrayView2<'_, f32>,
    y_pred: ArrayView2<'_, f32>,
) -> SeqModelResult<f64> {
    check_shapes(&y_true, &y_pred)?;
    Ok(mean(y_true.iter().zip(y_pred.iter()).map(|(&a, &b)| ((a - b) as f64).abs())))
}

/// Adapt `metric` to models whose output is shorter than their target.
///
/// Only the last `len(y_pred)` rows of `y_true` are scored. With a scaler,
/// both sides are transformed first.
pub fn metric_wrapper(
    metric: Metric,
    scaler: Option<Arc<dyn Transformer>>,
) -> impl Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>) -> SeqModelResult<f64> {
    move |y_true: ArrayView2<'_, f32>, y_pred: ArrayView2<'_, f32>| {
        if y_pred.nrows() > y_true.nrows() {
            return Err(SeqModelError::Validation(format!(
                "Prediction has {} rows but the target only {}",
                y_pred.nrows(),
                y_true.nrows()
            )));
        }
        let offset = y_true.nrows() - y_pred.nrows();
        let y_true = y_true.slice_axis(Axis(0), (offset..).into());
        match &scaler {
            Some(scaler) => {
                log::debug!("Transformer provided to metrics wrapper, scaling y and y_pred");
                let y_true = scaler.transform(&y_true.to_owned())?;
                let y_pred = scaler.transform(&y_pred.to_owned())?;
                metric(y_true.view(), y_pred.view())
            }
            None => metric(y_true, y_pred),
        }
    }
}
