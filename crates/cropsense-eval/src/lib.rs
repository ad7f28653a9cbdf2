//! CropSense Evaluation Engine
//!
//! Measures how far a crop recommendation can be trusted by stressing the
//! classification pipeline along three independent axes:
//!
//! - **Noise**: perturb N/P/K and count how often the label survives (RSS)
//! - **Missing features**: fall back to soil defaults one input at a time
//! - **Model agreement**: ask every registered model and measure consensus
//!
//! The [`ConfidenceAggregator`] blends top-class probability, agreement and
//! stability into one score, and the [`EvaluationRunner`] composes everything
//! into an [`EvaluationReport`].

pub mod agreement;
pub mod confidence;
pub mod config;
pub mod missing;
pub mod noise;
pub mod report;
pub mod runner;

pub use agreement::{summarize, ModelComparator};
pub use confidence::ConfidenceAggregator;
pub use config::{
    ConfidenceConfig, ConfidenceThresholds, ConfidenceWeights, EvaluationConfig, NoiseConfig,
};
pub use missing::{Ablation, MissingFeatureSimulator};
pub use noise::{MagnitudeRange, NoiseEngine, Perturbation};
pub use report::{
    AgreementReport, Axis, AxisFailure, ConfidenceLevel, ConfidenceScore, Distribution,
    EvaluationReport, FeatureResult, MissingFeatureReport, NoiseLevelReport, NoiseReport,
};
pub use runner::EvaluationRunner;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EvaluationConfig;
    pub use crate::report::{ConfidenceLevel, EvaluationReport};
    pub use crate::runner::EvaluationRunner;
}
