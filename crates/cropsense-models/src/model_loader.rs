//! Artifact resolution and model loading

use crate::boosting::GradientBoosting;
use crate::classifier::{CropModel, ModelId};
use crate::forest::RandomForest;
use crate::mlp::Mlp;
use crate::svm::SupportVectorMachine;
use cropsense_core::{Error, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Source location for an artifact file
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    /// Load from local file system (relative paths resolve against the artifacts dir)
    LocalPath(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
        filename: String,
    },
}

impl ArtifactSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::LocalPath(path.into())
    }

    /// Resolve to a readable local path, downloading if needed
    pub fn resolve(&self, artifacts_dir: &Path) -> Result<PathBuf> {
        match self {
            Self::LocalPath(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    artifacts_dir.join(path)
                };
                if !path.exists() {
                    return Err(Error::model_unavailable(format!(
                        "Artifact file not found: {:?}",
                        path
                    )));
                }
                Ok(path)
            }
            Self::HuggingFace {
                repo_id,
                revision,
                filename,
            } => {
                let api = Api::new().map_err(|e| {
                    Error::model_unavailable(format!("Failed to initialize HF API: {}", e))
                })?;

                let repo = api.repo(Repo::with_revision(
                    repo_id.clone(),
                    RepoType::Model,
                    revision.clone().unwrap_or_else(|| "main".to_string()),
                ));

                debug!("Fetching {} from {}", filename, repo_id);
                repo.get(filename).map_err(|e| {
                    Error::model_unavailable(format!(
                        "Failed to download {} from HF repo {}: {}",
                        filename, repo_id, e
                    ))
                })
            }
        }
    }
}

/// Load the model implementation that matches an id
pub fn load_model(id: ModelId, path: &Path) -> Result<Arc<dyn CropModel>> {
    let model: Arc<dyn CropModel> = match id {
        ModelId::Rf => Arc::new(RandomForest::from_file(path).map_err(|e| artifact_err(id, e))?),
        ModelId::Xgb => {
            Arc::new(GradientBoosting::from_file(path).map_err(|e| artifact_err(id, e))?)
        }
        ModelId::Svm => {
            Arc::new(SupportVectorMachine::from_file(path).map_err(|e| artifact_err(id, e))?)
        }
        ModelId::Mlp => Arc::new(Mlp::from_file(path).map_err(|e| artifact_err(id, e))?),
    };
    Ok(model)
}

fn artifact_err(id: ModelId, e: Error) -> Error {
    match e {
        Error::ModelUnavailable(msg) => Error::model_unavailable(format!("{}: {}", id, msg)),
        other => Error::model_unavailable(format!("{}: failed to read artifact: {}", id, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_resolves_against_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rf.json"), "{}").unwrap();

        let resolved = ArtifactSource::local("rf.json").resolve(dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join("rf.json"));
    }

    #[test]
    fn test_missing_local_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactSource::local("svm.json").resolve(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[test]
    fn test_malformed_artifact_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xgb.json");
        std::fs::write(&path, r#"{"n_features": 16}"#).unwrap();

        let err = load_model(ModelId::Xgb, &path).err().unwrap();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }
}
