//! Model builders available to each estimator type.

use crate::api::error::{SeqModelError, SeqModelResult};
use crate::api::network::ModelBuilder;
use crate::api::types::Kind;
use crate::core::linear::LinearBuilder;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DENSE_ESTIMATOR: &str = "DenseEstimator";
pub const SEQUENCE_ESTIMATOR: &str = "SequenceEstimator";

/// Builders keyed by estimator type name, then by builder name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    factories: BTreeMap<String, BTreeMap<String, Arc<dyn ModelBuilder>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `"linear"` baseline for both estimator types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let linear: Arc<dyn ModelBuilder> = Arc::new(LinearBuilder);
        for estimator in [DENSE_ESTIMATOR, SEQUENCE_ESTIMATOR] {
            registry
                .factories
                .entry(estimator.to_string())
                .or_default()
                .insert(linear.name().to_string(), linear.clone());
        }
        registry
    }

    pub fn register(
        &mut self,
        estimator: &str,
        builder: Arc<dyn ModelBuilder>,
    ) -> SeqModelResult<()> {
        let builders = self.factories.entry(estimator.to_string()).or_default();
        let name = builder.name().to_string();
        if builders.contains_key(&name) {
            return Err(SeqModelError::Validation(format!(
                "A model builder named '{}' is already registered for {}",
                name, estimator
            )));
        }
        log::debug!("Registered model builder '{}' for {}", name, estimator);
        builders.insert(name, builder);
        Ok(())
    }

    pub fn contains(&self, estimator: &str, kind: &str) -> bool {
        self.factories
            .get(estimator)
            .is_some_and(|builders| builders.contains_key(kind))
    }

    pub fn kinds(&self, estimator: &str) -> Vec<&str> {
        self.factories
            .get(estimator)
            .map(|builders| builders.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The builder an estimator of type `estimator` should use for `kind`.
    pub fn resolve(&self, estimator: &str, kind: &Kind) -> SeqModelResult<Arc<dyn ModelBuilder>> {
        match kind {
            Kind::Builder(builder) => Ok(builder.clone()),
            Kind::Named(name) => self
                .factories
                .get(estimator)
                .and_then(|builders| builders.get(name))
                .cloned()
                .ok_or_else(|| SeqModelError::UnknownModelKind {
                    kind: name.clone(),
                    estimator: estimator.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = ModelRegistry::with_defaults();
        assert!(registry.contains(DENSE_ESTIMATOR, "linear"));
        assert!(registry.contains(SEQUENCE_ESTIMATOR, "linear"));
        assert_eq!(registry.kinds(SEQUENCE_ESTIMATOR), vec!["linear"]);
        assert!(registry.kinds("Other").is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ModelRegistry::with_defaults();
        let err = registry
            .resolve(SEQUENCE_ESTIMATOR, &Kind::from("lstm"))
            .unwrap_err();
        assert!(matches!(
            err,
            SeqModelError::UnknownModelKind { ref kind, ref estimator }
                if kind == "lstm" && estimator == SEQUENCE_ESTIMATOR
        ));
    }

    #[test]
    fn test_builder_kind_bypasses_registry() {
        let registry = ModelRegistry::new();
        let builder: Arc<dyn ModelBuilder> = Arc::new(LinearBuilder);
        let resolved = registry
            .resolve(DENSE_ESTIMATOR, &Kind::Builder(builder))
            .unwrap();
        assert_eq!(resolved.name(), "linear");
        assert!(!registry.contains(DENSE_ESTIMATOR, "linear"));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ModelRegistry::with_defaults();
        let err = registry
            .register(DENSE_ESTIMATOR, Arc::new(LinearBuilder))
            .unwrap_err();
        assert!(matches!(err, SeqModelError::Validation(_)));
    }
}
