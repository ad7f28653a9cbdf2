//! Feature vector construction
//!
//! Turns a validated [`InputRecord`] into the exact numeric layout the
//! classifiers were trained on:
//!
//! - nine scaled numeric features (`NUMERIC_FEATURES`), including the derived
//!   `nutrient_ratio` and `climate_index`
//! - a one-hot soil block followed by a one-hot season block
//!
//! Zero-valued nutrients are replaced by the soil default before scaling.

use crate::error::{Error, Result};
use crate::types::{InputRecord, Season, SoilType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scaled numeric features, in model input order
pub const NUMERIC_FEATURES: [&str; 9] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
    "nutrient_ratio",
    "climate_index",
];

/// Total model input width
pub const FEATURE_COUNT: usize = NUMERIC_FEATURES.len() + SoilType::ALL.len() + Season::ALL.len();

/// Stored standardisation parameters (mean/std per numeric feature)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl ScalerParams {
    /// Parameters that leave values unchanged
    pub fn identity() -> Self {
        Self {
            feature_names: NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
            mean: vec![0.0; NUMERIC_FEATURES.len()],
            std: vec![1.0; NUMERIC_FEATURES.len()],
        }
    }

    /// Load from a JSON artifact
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let params: Self = serde_json::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject parameters whose layout does not match `NUMERIC_FEATURES`
    pub fn validate(&self) -> Result<()> {
        let expected: Vec<&str> = NUMERIC_FEATURES.to_vec();
        let actual: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if actual != expected {
            return Err(Error::model_unavailable(format!(
                "scaler feature layout {:?} does not match expected {:?}",
                actual, expected
            )));
        }
        if self.mean.len() != expected.len() || self.std.len() != expected.len() {
            return Err(Error::model_unavailable(format!(
                "scaler expects {} means and stds, got {} and {}",
                expected.len(),
                self.mean.len(),
                self.std.len()
            )));
        }
        if self.mean.iter().chain(&self.std).any(|v| !v.is_finite()) {
            return Err(Error::model_unavailable("scaler contains non-finite values"));
        }
        Ok(())
    }

    fn scale(&self, index: usize, value: f64) -> f64 {
        // constant columns were fitted with std 0
        let std = if self.std[index] == 0.0 { 1.0 } else { self.std[index] };
        (value - self.mean[index]) / std
    }
}

/// Encoded model input. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap raw values (used by tests and benchmarks)
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a scaled numeric feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        NUMERIC_FEATURES
            .iter()
            .position(|f| *f == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Pure record -> vector encoder
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    scaler: ScalerParams,
}

impl FeatureVectorBuilder {
    pub fn new(scaler: ScalerParams) -> Result<Self> {
        scaler.validate()?;
        Ok(Self { scaler })
    }

    /// Builder that skips scaling
    pub fn unscaled() -> Self {
        Self {
            scaler: ScalerParams::identity(),
        }
    }

    pub fn scaler(&self) -> &ScalerParams {
        &self.scaler
    }

    /// Encode a record
    pub fn build(&self, record: &InputRecord) -> Result<FeatureVector> {
        record.validate()?;
        let resolved = record.with_soil_defaults();

        let nutrient_ratio = (resolved.n + resolved.p + resolved.k) / 3.0;
        let climate_index = resolved.temperature * resolved.humidity;
        let raw = [
            resolved.n,
            resolved.p,
            resolved.k,
            resolved.temperature,
            resolved.humidity,
            resolved.ph,
            resolved.rainfall,
            nutrient_ratio,
            climate_index,
        ];

        let mut values = Vec::with_capacity(FEATURE_COUNT);
        values.extend(raw.iter().enumerate().map(|(i, v)| self.scaler.scale(i, *v)));

        let mut soil = [0.0; SoilType::ALL.len()];
        soil[resolved.soil_type.index()] = 1.0;
        values.extend_from_slice(&soil);

        let mut season = [0.0; Season::ALL.len()];
        season[resolved.season.index()] = 1.0;
        values.extend_from_slice(&season);

        Ok(FeatureVector { values })
    }
}
