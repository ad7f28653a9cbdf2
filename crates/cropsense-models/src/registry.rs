//! Model registry initialization and management
//!
//! The registry is loaded once at process start and never reloaded. Every
//! configured artifact must load and agree on the feature layout and label
//! set, otherwise loading fails and the process should not start.

use crate::classifier::{CropModel, LabelSet, ModelHandle, ModelId};
use crate::config::RegistryConfig;
use crate::model_loader::load_model;
use cropsense_core::{Error, FeatureVectorBuilder, Result, ScalerParams, FEATURE_COUNT};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Registry shared by every evaluation
pub type SharedRegistry = Arc<ModelRegistry>;

/// Read-only set of loaded models plus the feature encoder they were trained with
#[derive(Debug)]
pub struct ModelRegistry {
    /// Handles sorted by priority
    handles: Vec<ModelHandle>,

    /// Encoder matching the models' training layout
    builder: FeatureVectorBuilder,

    labels: Arc<LabelSet>,
}

impl ModelRegistry {
    /// Assemble a registry from already-built models
    pub fn from_models(
        builder: FeatureVectorBuilder,
        labels: LabelSet,
        models: Vec<(ModelId, Arc<dyn CropModel>)>,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::model_unavailable("registry needs at least one model"));
        }

        let labels = Arc::new(labels);
        let mut handles: Vec<ModelHandle> = Vec::with_capacity(models.len());

        for (id, model) in models {
            if handles.iter().any(|h| h.id() == id) {
                return Err(Error::model_unavailable(format!(
                    "model '{}' registered twice",
                    id
                )));
            }
            if model.n_features() != FEATURE_COUNT {
                return Err(Error::model_unavailable(format!(
                    "{} expects {} features, feature layout has {}",
                    id,
                    model.n_features(),
                    FEATURE_COUNT
                )));
            }
            if model.n_classes() != labels.len() {
                return Err(Error::model_unavailable(format!(
                    "{} predicts {} classes, label set has {}",
                    id,
                    model.n_classes(),
                    labels.len()
                )));
            }
            handles.push(ModelHandle::new(id, model, Arc::clone(&labels)));
        }

        handles.sort_by_key(|h| h.id());

        Ok(Self {
            handles,
            builder,
            labels,
        })
    }

    /// Load every configured artifact, failing on the first problem
    pub fn load(config: &RegistryConfig) -> Result<Self> {
        let dir = config.artifacts_dir.as_path();

        info!("Initializing model registry with {} models", config.models.len());

        let scaler_path = config.scaler.to_source().resolve(dir)?;
        let builder = FeatureVectorBuilder::new(ScalerParams::from_file(&scaler_path).map_err(
            |e| Error::model_unavailable(format!("scaler {:?}: {}", scaler_path, e)),
        )?)?;

        let labels_path = config.labels.to_source().resolve(dir)?;
        let labels = LabelSet::from_file(&labels_path)
            .map_err(|e| Error::model_unavailable(format!("labels {:?}: {}", labels_path, e)))?;
        info!("Loaded {} crop labels", labels.len());

        let mut models = Vec::with_capacity(config.models.len());
        for (id, source) in &config.models {
            info!("Loading model: {}", id);
            let path = source.to_source().resolve(dir)?;
            let model = load_model(*id, &path)?;
            info!("✓ Loaded model: {} ({})", id, model.algorithm());
            models.push((*id, model));
        }

        let registry = Self::from_models(builder, labels, models)?;
        info!("Model registry initialized with {} models", registry.len());
        Ok(registry)
    }

    /// Load from a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = RegistryConfig::from_file(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to load registry config: {}", e)))?;
        Self::load(&config)
    }

    /// Get a model by id
    pub fn get(&self, id: ModelId) -> Result<&ModelHandle> {
        self.handles
            .iter()
            .find(|h| h.id() == id)
            .ok_or_else(|| Error::model_unavailable(format!("model '{}' is not loaded", id)))
    }

    /// All models, highest priority first
    pub fn all(&self) -> &[ModelHandle] {
        &self.handles
    }

    pub fn feature_builder(&self) -> &FeatureVectorBuilder {
        &self.builder
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn has_model(&self, id: ModelId) -> bool {
        self.handles.iter().any(|h| h.id() == id)
    }

    /// Wrap for sharing across evaluations
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactSourceSpec;
    use cropsense_core::FeatureVector;
    use std::collections::BTreeMap;

    struct Constant {
        classes: usize,
        width: usize,
    }

    impl CropModel for Constant {
        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>> {
            Ok(vec![1.0 / self.classes as f64; self.classes])
        }

        fn n_features(&self) -> usize {
            self.width
        }

        fn n_classes(&self) -> usize {
            self.classes
        }

        fn algorithm(&self) -> &str {
            "constant"
        }
    }

    fn labels() -> LabelSet {
        LabelSet::new(vec!["rice".into(), "maize".into()]).unwrap()
    }

    fn constant(classes: usize) -> Arc<dyn CropModel> {
        Arc::new(Constant {
            classes,
            width: FEATURE_COUNT,
        })
    }

    #[test]
    fn test_handles_sorted_by_priority() {
        let registry = ModelRegistry::from_models(
            FeatureVectorBuilder::unscaled(),
            labels(),
            vec![
                (ModelId::Mlp, constant(2)),
                (ModelId::Rf, constant(2)),
                (ModelId::Svm, constant(2)),
            ],
        )
        .unwrap();

        let ids: Vec<ModelId> = registry.all().iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![ModelId::Rf, ModelId::Svm, ModelId::Mlp]);
        assert!(registry.get(ModelId::Svm).is_ok());
        assert!(matches!(
            registry.get(ModelId::Xgb),
            Err(Error::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_rejects_class_count_mismatch() {
        let result = ModelRegistry::from_models(
            FeatureVectorBuilder::unscaled(),
            labels(),
            vec![(ModelId::Rf, constant(3))],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_feature_width_mismatch() {
        let model: Arc<dyn CropModel> = Arc::new(Constant {
            classes: 2,
            width: 7,
        });
        let result = ModelRegistry::from_models(
            FeatureVectorBuilder::unscaled(),
            labels(),
            vec![(ModelId::Rf, model)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(ModelRegistry::from_models(FeatureVectorBuilder::unscaled(), labels(), vec![])
            .is_err());
        assert!(ModelRegistry::from_models(
            FeatureVectorBuilder::unscaled(),
            labels(),
            vec![(ModelId::Rf, constant(2)), (ModelId::Rf, constant(2))],
        )
        .is_err());
    }

    #[test]
    fn test_load_fails_fast_on_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scaler.json"),
            serde_json::to_string(&ScalerParams::identity()).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("labels.json"), r#"["rice","maize"]"#).unwrap();

        let mut models = BTreeMap::new();
        models.insert(ModelId::Rf, ArtifactSourceSpec::local("rf.json"));
        let config = RegistryConfig {
            artifacts_dir: dir.path().to_path_buf(),
            models,
            ..RegistryConfig::default()
        };

        let err = ModelRegistry::load(&config).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }
}
