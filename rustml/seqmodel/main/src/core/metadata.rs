use crate::api::error::SeqModelResult;
use crate::api::estimator::{ComposedModel, Estimator};
use rustml_tsgen::SeriesData;
use serde_json::{Map, Value};

/// Collect the metadata of every model reachable through `model`.
///
/// Later entries overwrite earlier ones on key collisions. A pipeline only
/// contributes its final step.
pub fn extract_metadata(model: &ComposedModel<'_>) -> Map<String, Value> {
    let mut metadata = Map::new();
    collect(model, &mut metadata);
    metadata
}

fn collect(model: &ComposedModel<'_>, metadata: &mut Map<String, Value>) {
    match model {
        ComposedModel::Opaque => {}
        ComposedModel::Leaf(estimator) => metadata.extend(estimator.get_metadata()),
        ComposedModel::Pipeline(final_step) => collect(&final_step.composition(), metadata),
        ComposedModel::Wrapper { own, submodels } => {
            metadata.extend(own.clone());
            for submodel in submodels {
                collect(submodel, metadata);
            }
        }
    }
}

/// How many rows shorter the model's output is than its input.
pub fn determine_offset(model: &dyn Estimator, x: &SeriesData) -> SeqModelResult<usize> {
    let out = model.predict(x)?;
    Ok(x.nrows().saturating_sub(out.nrows()))
}
