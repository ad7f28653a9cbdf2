//! CropSense Models
//!
//! Trained crop classifiers evaluated natively in Rust.
//!
//! Four interchangeable algorithms implement [`CropModel`]:
//! - Random forest (`rf`)
//! - Gradient-boosted trees (`xgb`)
//! - One-vs-rest kernel SVM (`svm`)
//! - Multi-layer perceptron on Candle (`mlp`)
//!
//! All models are loaded once into a read-only [`ModelRegistry`] and run on CPU.

pub mod boosting;
pub mod classifier;
pub mod config;
pub mod forest;
pub mod mlp;
pub mod model_loader;
pub mod registry;
pub mod svm;
pub mod tree;

pub use boosting::GradientBoosting;
pub use classifier::{argmax, softmax, CropModel, LabelSet, ModelHandle, ModelId, Prediction};
pub use config::{ArtifactSourceSpec, RegistryConfig};
pub use forest::RandomForest;
pub use mlp::Mlp;
pub use model_loader::{load_model, ArtifactSource};
pub use registry::{ModelRegistry, SharedRegistry};
pub use svm::{Kernel, SupportVectorMachine};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{CropModel, ModelHandle, ModelId, Prediction};
    pub use crate::registry::{ModelRegistry, SharedRegistry};
}
