use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::estimator::{ComposedModel, Estimator, Transformer};
use crate::core::metadata::extract_metadata;
use ndarray::Array2;
use rustml_tsgen::SeriesData;
use serde_json::{Map, Value};

/// Transformer steps applied to `X` in order, followed by an estimator.
///
/// Time indexes survive the transformation, so the final estimator can use
/// the chunk-aware generators.
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<(String, Box<dyn Transformer>)>,
    estimator: (String, Box<dyn Estimator>),
}

impl Pipeline {
    pub fn new(name: impl Into<String>, estimator: Box<dyn Estimator>) -> Self {
        Self {
            steps: Vec::new(),
            estimator: (name.into(), estimator),
        }
    }

    /// Insert a transformer ahead of the estimator.
    pub fn with_step(mut self, name: impl Into<String>, step: Box<dyn Transformer>) -> Self {
        self.steps.push((name.into(), step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(std::iter::once(self.estimator.0.as_str()))
            .collect()
    }

    pub fn final_estimator(&self) -> &dyn Estimator {
        self.estimator.1.as_ref()
    }

    fn transform(&self, x: &SeriesData) -> SeqModelResult<SeriesData> {
        let mut values: Array2<f32> = x.values().clone();
        for (_, step) in &self.steps {
            values = step.transform(&values)?;
        }
        Ok(x.map_values(values)?)
    }
}

impl Estimator for Pipeline {
    fn fit(&mut self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<()> {
        let mut values: Array2<f32> = x.values().clone();
        for (name, step) in &mut self.steps {
            log::debug!("Fitting pipeline step '{}'", name);
            values = step.fit_transform(&values)?;
        }
        let xt = x.map_values(values)?;
        self.estimator.1.fit(&xt, y)
    }

    fn predict(&self, x: &SeriesData) -> SeqModelResult<Array2<f32>> {
        self.estimator.1.predict(&self.transform(x)?)
    }

    fn score(&self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<f64> {
        self.estimator.1.score(&self.transform(x)?, y)
    }

    fn get_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert(
            "steps".to_string(),
            Value::Array(
                self.step_names()
                    .into_iter()
                    .map(|name| Value::String(name.to_string()))
                    .collect(),
            ),
        );
        params.insert(
            self.estimator.0.clone(),
            Value::Object(self.estimator.1.get_params()),
        );
        params
    }

    fn get_metadata(&self) -> Map<String, Value> {
        extract_metadata(&self.composition())
    }

    fn composition(&self) -> ComposedModel<'_> {
        ComposedModel::Pipeline(self.final_estimator())
    }
}

impl TryFrom<Vec<(String, PipelineStep)>> for Pipeline {
    type Error = SeqModelError;

    /// Steps in order; only the last one may be an estimator.
    fn try_from(steps: Vec<(String, PipelineStep)>) -> SeqModelResult<Self> {
        let mut transformers = Vec::new();
        let mut estimator = None;
        for (name, step) in steps {
            if estimator.is_some() {
                return Err(SeqModelError::Validation(format!(
                    "Pipeline step '{}' follows the final estimator",
                    name
                )));
            }
            match step {
                PipelineStep::Transformer(t) => transformers.push((name, t)),
                PipelineStep::Estimator(e) => estimator = Some((name, e)),
            }
        }
        let estimator = estimator.ok_or_else(|| {
            SeqModelError::Validation("Pipeline must end with an estimator".to_string())
        })?;
        Ok(Self {
            steps: transformers,
            estimator,
        })
    }
}

/// One entry of a pipeline definition.
#[derive(Debug)]
pub enum PipelineStep {
    Transformer(Box<dyn Transformer>),
    Estimator(Box<dyn Estimator>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dense::DenseEstimator;
    use crate::core::registry::ModelRegistry;
    use crate::core::scaler::MinMaxScaler;
    use serde_json::json;

    fn dense() -> Box<dyn Estimator> {
        let registry = ModelRegistry::with_defaults();
        let kwargs = json!({"epochs": 2}).as_object().cloned().unwrap();
        Box::new(DenseEstimator::new(&registry, "linear", kwargs).unwrap())
    }

    #[test]
    fn test_fit_predict_through_scaler() {
        let mut pipeline = Pipeline::new("model", dense()).with_step("scale", Box::new(MinMaxScaler::new()));
        let x: SeriesData = Array2::from_shape_fn((20, 2), |(i, j)| (i * 10 + j) as f32).into();
        pipeline.fit(&x, &x).unwrap();

        assert_eq!(pipeline.predict(&x).unwrap().dim(), (20, 2));
        assert_eq!(pipeline.step_names(), vec!["scale", "model"]);
        assert_eq!(pipeline.get_params()["model"]["n_features"], 2);
        assert_eq!(
            pipeline.get_metadata()["history"]["loss"].as_array().unwrap().len(),
            2
        );
    }

    #[test]
    fn test_try_from_steps() {
        let steps = vec![
            ("scale".to_string(), PipelineStep::Transformer(Box::new(MinMaxScaler::new()))),
            ("model".to_string(), PipelineStep::Estimator(dense())),
        ];
        assert!(Pipeline::try_from(steps).is_ok());

        let no_estimator = vec![(
            "scale".to_string(),
            PipelineStep::Transformer(Box::new(MinMaxScaler::new())),
        )];
        assert!(Pipeline::try_from(no_estimator).is_err());

        let trailing = vec![
            ("model".to_string(), PipelineStep::Estimator(dense())),
            ("scale".to_string(), PipelineStep::Transformer(Box::new(MinMaxScaler::new()))),
        ];
        assert!(Pipeline::try_from(trailing).is_err());
    }
}
