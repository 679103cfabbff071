//! Dense estimator described by a declarative model spec.

use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::estimator::{ComposedModel, Estimator};
use crate::api::types::Kind;
use crate::core::dense::DenseEstimator;
use crate::core::registry::{ModelRegistry, DENSE_ESTIMATOR};
use ndarray::Array2;
use rustml_tsgen::SeriesData;
use serde_json::{Map, Value};

const EXPECTED_KEYS: [&str; 2] = ["spec", "compile"];

/// A [`DenseEstimator`] built from
/// `{"spec": {<builder>: {..}}, "compile": {..}}`.
///
/// The single `spec` entry names a registered dense builder and holds its
/// architecture options; `compile` holds training options such as
/// `learning_rate`. Both are handed to the builder as keyword arguments.
#[derive(Debug)]
pub struct RawModelRegressor {
    kind: Map<String, Value>,
    inner: DenseEstimator,
}

impl RawModelRegressor {
    pub fn new(
        registry: &ModelRegistry,
        kind: Map<String, Value>,
        kwargs: Map<String, Value>,
    ) -> SeqModelResult<Self> {
        if !EXPECTED_KEYS.iter().all(|key| kind.contains_key(*key)) {
            let found: Vec<&str> = kind.keys().map(String::as_str).collect();
            return Err(SeqModelError::InvalidSpec(format!(
                "Expected spec to have keys: {:?}, but found {:?}",
                EXPECTED_KEYS, found
            )));
        }
        log::debug!("Building model from spec: {}", Value::Object(kind.clone()));

        let (builder_name, architecture) = single_entry(&kind["spec"], "spec")?;
        let compile = as_object(&kind["compile"], "compile")?;
        let architecture = as_object(architecture, builder_name)?;

        let builder = registry.resolve(DENSE_ESTIMATOR, &Kind::from(builder_name))?;
        let mut merged = kwargs;
        merged.extend(architecture.clone());
        merged.extend(compile.clone());

        let inner = DenseEstimator::with_builder(builder_name.to_string(), builder, merged);
        Ok(Self { kind, inner })
    }

    pub fn spec(&self) -> &Map<String, Value> {
        &self.kind
    }

    pub fn inner(&self) -> &DenseEstimator {
        &self.inner
    }
}

fn as_object<'a>(value: &'a Value, field: &str) -> SeqModelResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SeqModelError::InvalidSpec(format!("'{}' must be a mapping, got {}", field, value)))
}

fn single_entry<'a>(value: &'a Value, field: &str) -> SeqModelResult<(&'a str, &'a Value)> {
    let map = as_object(value, field)?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((name, inner)), None) => Ok((name.as_str(), inner)),
        _ => Err(SeqModelError::InvalidSpec(format!(
            "'{}' must name exactly one model, found {}",
            field,
            map.len()
        ))),
    }
}

impl Estimator for RawModelRegressor {
    fn fit(&mut self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<()> {
        self.inner.fit(x, y)
    }

    fn predict(&self, x: &SeriesData) -> SeqModelResult<Array2<f32>> {
        self.inner.predict(x)
    }

    fn score(&self, x: &SeriesData, y: &SeriesData) -> SeqModelResult<f64> {
        self.inner.score(x, y)
    }

    fn get_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("kind".to_string(), Value::Object(self.kind.clone()));
        params
    }

    fn get_metadata(&self) -> Map<String, Value> {
        self.inner.get_metadata()
    }

    fn composition(&self) -> ComposedModel<'_> {
        ComposedModel::Leaf(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builds_and_fits() {
        let registry = ModelRegistry::with_defaults();
        let kind = object(json!({
            "spec": {"linear": {}},
            "compile": {"learning_rate": 0.05, "epochs": 3},
        }));
        let mut model = RawModelRegressor::new(&registry, kind.clone(), Map::new()).unwrap();

        let x: SeriesData = Array2::from_shape_fn((10, 4), |(i, j)| (i * j) as f32 / 40.0).into();
        let y: SeriesData = Array2::from_shape_fn((10, 1), |(i, _)| i as f32 / 10.0).into();
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict(&x).unwrap().dim(), (10, 1));
        assert_eq!(model.get_params()["kind"], Value::Object(kind));
        assert_eq!(model.inner().get_params()["learning_rate"], 0.05);
        assert_eq!(model.get_metadata()["history"]["loss"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_keys() {
        let registry = ModelRegistry::with_defaults();
        let err = RawModelRegressor::new(&registry, object(json!({"spec": {"linear": {}}})), Map::new())
            .unwrap_err();
        assert!(matches!(err, SeqModelError::InvalidSpec(ref msg) if msg.contains("compile")));
    }

    #[test]
    fn test_spec_must_name_one_registered_builder() {
        let registry = ModelRegistry::with_defaults();
        let two = object(json!({"spec": {"linear": {}, "other": {}}, "compile": {}}));
        assert!(matches!(
            RawModelRegressor::new(&registry, two, Map::new()).unwrap_err(),
            SeqModelError::InvalidSpec(_)
        ));

        let unknown = object(json!({"spec": {"mlp": {}}, "compile": {}}));
        assert!(matches!(
            RawModelRegressor::new(&registry, unknown, Map::new()).unwrap_err(),
            SeqModelError::UnknownModelKind { .. }
        ));
    }
}
