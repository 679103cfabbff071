//! Epoch loops shared by the estimators.

use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::network::Network;
use crate::api::types::{FitParams, History};
use ndarray::{concatenate, s, Array2, ArrayD, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rustml_tsgen::BatchSource;
use serde_json::json;

/// Train `network` for `params.epochs` epochs over every batch of `source`.
///
/// With `params.shuffle` the batch order changes every epoch; the rows
/// inside a batch are whatever the source yields.
pub fn fit_batches(
    network: &mut dyn Network,
    source: &dyn BatchSource,
    params: &FitParams,
) -> SeqModelResult<History> {
    run_epochs(network, source.len(), params, |index| {
        let batch = source.get(index)?;
        Ok((batch.x.into_dyn(), batch.y))
    })
}

/// Train on row-aligned `x` and `y` in mini-batches of `params.batch_size`.
pub fn fit_arrays(
    network: &mut dyn Network,
    x: ArrayView2<'_, f32>,
    y: ArrayView2<'_, f32>,
    params: &FitParams,
) -> SeqModelResult<History> {
    if x.nrows() != y.nrows() {
        return Err(SeqModelError::Validation(format!(
            "X and y must have the same number of rows, got {} and {}",
            x.nrows(),
            y.nrows()
        )));
    }
    let batch_size = checked_batch_size(params.batch_size)?;
    let steps = x.nrows().div_ceil(batch_size);
    run_epochs(network, steps, params, |index| {
        let rows = index * batch_size..((index + 1) * batch_size).min(x.nrows());
        Ok((
            x.slice(s![rows.clone(), ..]).to_owned().into_dyn(),
            y.slice(s![rows, ..]).to_owned(),
        ))
    })
}

/// Predictions for every batch of `source`, stacked in order.
pub fn predict_batches(network: &dyn Network, source: &dyn BatchSource) -> SeqModelResult<Array2<f32>> {
    let mut outputs = Vec::with_capacity(source.len());
    for index in 0..source.len() {
        let batch = source.get(index)?;
        outputs.push(network.predict_on_batch(batch.x.view().into_dyn())?);
    }
    stack_rows(outputs)
}

/// Predictions for `x` computed `batch_size` rows at a time.
pub fn predict_arrays(
    network: &dyn Network,
    x: ArrayView2<'_, f32>,
    batch_size: usize,
) -> SeqModelResult<Array2<f32>> {
    let batch_size = checked_batch_size(batch_size)?;
    let mut outputs = Vec::new();
    for chunk in x.axis_chunks_iter(Axis(0), batch_size) {
        outputs.push(network.predict_on_batch(chunk.into_dyn())?);
    }
    stack_rows(outputs)
}

fn checked_batch_size(batch_size: usize) -> SeqModelResult<usize> {
    if batch_size == 0 {
        return Err(SeqModelError::Validation(
            "batch_size must be at least 1".to_string(),
        ));
    }
    Ok(batch_size)
}

fn stack_rows(outputs: Vec<Array2<f32>>) -> SeqModelResult<Array2<f32>> {
    if outputs.is_empty() {
        return Err(SeqModelError::Validation(
            "Nothing to predict: input produced no batches".to_string(),
        ));
    }
    let views: Vec<_> = outputs.iter().map(|o| o.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| SeqModelError::Backend(e.to_string()))
}

fn run_epochs<F>(
    network: &mut dyn Network,
    steps: usize,
    params: &FitParams,
    mut batch: F,
) -> SeqModelResult<History>
where
    F: FnMut(usize) -> SeqModelResult<(ArrayD<f32>, Array2<f32>)>,
{
    if steps == 0 {
        return Err(SeqModelError::Validation(
            "Cannot train on an empty set of batches".to_string(),
        ));
    }

    let mut history = History {
        loss: Vec::with_capacity(params.epochs),
        params: json!({
            "epochs": params.epochs,
            "steps": steps,
            "verbose": params.verbose,
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
    };

    let mut order: Vec<usize> = (0..steps).collect();
    let mut rng = rand::thread_rng();
    for epoch in 1..=params.epochs {
        if params.shuffle {
            order.shuffle(&mut rng);
        }

        let mut total_loss = 0.0;
        for &index in &order {
            let (x, y) = batch(index)?;
            total_loss += network.train_on_batch(x.view(), y.view())?;
        }
        let loss = total_loss / steps as f32;

        log::info!("Epoch {}/{}: loss={:.6}", epoch, params.epochs, loss);
        history.loss.push(loss);
    }

    Ok(history)
}
