//! Configuration for model artifacts and registry loading

use crate::model_loader::ArtifactSource;
use crate::ModelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where the registry finds its artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base directory for relative local paths
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Standardisation parameters
    #[serde(default = "default_scaler")]
    pub scaler: ArtifactSourceSpec,

    /// Ordered label set
    #[serde(default = "default_labels")]
    pub labels: ArtifactSourceSpec,

    /// Model artifacts by id
    #[serde(default = "default_models")]
    pub models: BTreeMap<ModelId, ArtifactSourceSpec>,
}

/// Artifact source specification (for config files)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactSourceSpec {
    /// Local file path
    Local { path: PathBuf },

    /// Hugging Face Hub
    HuggingFace {
        repo_id: String,
        filename: String,
        revision: Option<String>,
    },
}

impl ArtifactSourceSpec {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    pub fn to_source(&self) -> ArtifactSource {
        match self {
            Self::Local { path } => ArtifactSource::LocalPath(path.clone()),
            Self::HuggingFace {
                repo_id,
                filename,
                revision,
            } => ArtifactSource::HuggingFace {
                repo_id: repo_id.clone(),
                revision: revision.clone(),
                filename: filename.clone(),
            },
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            scaler: default_scaler(),
            labels: default_labels(),
            models: default_models(),
        }
    }
}

impl RegistryConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }

    /// Configured model ids, in priority order
    pub fn model_ids(&self) -> Vec<ModelId> {
        self.models.keys().copied().collect()
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_scaler() -> ArtifactSourceSpec {
    ArtifactSourceSpec::local("scaler.json")
}

fn default_labels() -> ArtifactSourceSpec {
    ArtifactSourceSpec::local("labels.json")
}

fn default_models() -> BTreeMap<ModelId, ArtifactSourceSpec> {
    ModelId::PRIORITY
        .iter()
        .map(|id| (*id, ArtifactSourceSpec::local(id.default_artifact())))
        .collect()
}
