//! CropSense Core
//!
//! Core types, traits, and utilities shared across CropSense components.
//!
//! This crate provides:
//! - The validated input record and its soil/season enums
//! - Soil-specific default readings
//! - The feature vector builder and stored scaling parameters
//! - Error types and result handling

pub mod error;
pub mod features;
pub mod types;

pub use error::{Error, Result};
pub use features::{
    FeatureVector, FeatureVectorBuilder, ScalerParams, FEATURE_COUNT, NUMERIC_FEATURES,
};
pub use types::{
    Feature, InputPayload, InputRecord, Season, SoilDefaults, SoilType, DEFAULT_PH, NUTRIENT_MAX,
    NUTRIENT_MIN,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::features::{FeatureVector, FeatureVectorBuilder};
    pub use crate::types::{Feature, InputRecord, Season, SoilType};
}
