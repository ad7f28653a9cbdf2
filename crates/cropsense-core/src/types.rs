//! Core types for CropSense

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nutrient values are bounded by the soil test range
pub const NUTRIENT_MIN: f64 = 0.0;
pub const NUTRIENT_MAX: f64 = 140.0;

/// pH used when the caller does not supply one
pub const DEFAULT_PH: f64 = 6.5;

/// Soil type as entered by the farmer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Black,
    Red,
    Alluvial,
    Laterite,
}

impl SoilType {
    /// All soil types in declaration (and one-hot) order
    pub const ALL: [SoilType; 4] = [
        SoilType::Black,
        SoilType::Red,
        SoilType::Alluvial,
        SoilType::Laterite,
    ];

    /// Position in the one-hot block
    pub fn index(self) -> usize {
        match self {
            Self::Black => 0,
            Self::Red => 1,
            Self::Alluvial => 2,
            Self::Laterite => 3,
        }
    }

    /// Deterministic wrong alternative: the next soil type, wrapping around
    pub fn alternative(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Typical readings for this soil, used when a value is unknown
    pub fn defaults(self) -> SoilDefaults {
        match self {
            Self::Black => SoilDefaults::new(70.0, 40.0, 50.0, 65.0, 110.0),
            Self::Red => SoilDefaults::new(40.0, 30.0, 35.0, 60.0, 90.0),
            Self::Alluvial => SoilDefaults::new(60.0, 35.0, 40.0, 75.0, 120.0),
            Self::Laterite => SoilDefaults::new(50.0, 35.0, 40.0, 80.0, 150.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::Red => "Red",
            Self::Alluvial => "Alluvial",
            Self::Laterite => "Laterite",
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoilType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(Self::Black),
            "red" => Ok(Self::Red),
            "alluvial" => Ok(Self::Alluvial),
            "laterite" => Ok(Self::Laterite),
            other => Err(Error::validation(
                "soilType",
                format!("unrecognized soil type '{}'", other),
            )),
        }
    }
}

/// Cropping season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Kharif,
    Rabi,
    Zaid,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Kharif, Season::Rabi, Season::Zaid];

    pub fn index(self) -> usize {
        match self {
            Self::Kharif => 0,
            Self::Rabi => 1,
            Self::Zaid => 2,
        }
    }
}

impl FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kharif" => Ok(Self::Kharif),
            "rabi" => Ok(Self::Rabi),
            "zaid" | "summer" => Ok(Self::Zaid),
            other => Err(Error::validation(
                "season",
                format!("unrecognized season '{}'", other),
            )),
        }
    }
}

/// Numeric input fields that can be perturbed or ablated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    pub const NUTRIENTS: [Feature; 3] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
    ];

    /// Name as used in the external contract
    pub fn name(self) -> &'static str {
        match self {
            Self::Nitrogen => "N",
            Self::Phosphorus => "P",
            Self::Potassium => "K",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Ph => "ph",
            Self::Rainfall => "rainfall",
        }
    }
}

/// Per-soil default readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilDefaults {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl SoilDefaults {
    const fn new(n: f64, p: f64, k: f64, humidity: f64, rainfall: f64) -> Self {
        Self {
            n,
            p,
            k,
            temperature: 25.0,
            humidity,
            ph: DEFAULT_PH,
            rainfall,
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Nitrogen => self.n,
            Feature::Phosphorus => self.p,
            Feature::Potassium => self.k,
            Feature::Temperature => self.temperature,
            Feature::Humidity => self.humidity,
            Feature::Ph => self.ph,
            Feature::Rainfall => self.rainfall,
        }
    }
}

/// A single, already weather-enriched request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputRecord {
    #[serde(rename = "soilType")]
    pub soil_type: SoilType,
    pub season: Season,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub ph: f64,
}

impl InputRecord {
    /// Read a numeric field
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Nitrogen => self.n,
            Feature::Phosphorus => self.p,
            Feature::Potassium => self.k,
            Feature::Temperature => self.temperature,
            Feature::Humidity => self.humidity,
            Feature::Ph => self.ph,
            Feature::Rainfall => self.rainfall,
        }
    }

    /// Copy of this record with one numeric field replaced
    pub fn with(&self, feature: Feature, value: f64) -> Self {
        let mut next = self.clone();
        match feature {
            Feature::Nitrogen => next.n = value,
            Feature::Phosphorus => next.p = value,
            Feature::Potassium => next.k = value,
            Feature::Temperature => next.temperature = value,
            Feature::Humidity => next.humidity = value,
            Feature::Ph => next.ph = value,
            Feature::Rainfall => next.rainfall = value,
        }
        next
    }

    /// Copy of this record with a different soil type
    pub fn with_soil_type(&self, soil_type: SoilType) -> Self {
        Self {
            soil_type,
            ..self.clone()
        }
    }

    /// Copy with zero-valued nutrients replaced by the soil default.
    ///
    /// A zero N/P/K reading means "unknown" to the farmers entering it.
    pub fn with_soil_defaults(&self) -> Self {
        let defaults = self.soil_type.defaults();
        let mut next = self.clone();
        for feature in Feature::NUTRIENTS {
            if self.get(feature) == 0.0 {
                next = next.with(feature, defaults.get(feature));
            }
        }
        next
    }

    /// Check every field against its documented domain
    pub fn validate(&self) -> Result<()> {
        for feature in Feature::NUTRIENTS {
            check_range(feature.name(), self.get(feature), NUTRIENT_MIN, NUTRIENT_MAX)?;
        }
        check_range("ph", self.ph, 0.0, 14.0)?;
        check_range("humidity", self.humidity, 0.0, 100.0)?;
        check_range("temperature", self.temperature, -10.0, 60.0)?;
        check_range("rainfall", self.rainfall, 0.0, f64::MAX)?;

        if self.location.trim().chars().count() < 2 {
            return Err(Error::validation(
                "location",
                "must be at least 2 characters",
            ));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(field, "must be a finite number"));
    }
    if value < min || value > max {
        return Err(Error::validation(
            field,
            format!("{} is outside [{}, {}]", value, min, max),
        ));
    }
    Ok(())
}

/// Wire form of an input record, before enum parsing and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPayload {
    #[serde(rename = "soilType")]
    pub soil_type: String,
    pub season: String,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    #[serde(default)]
    pub ph: Option<f64>,
}

impl TryFrom<InputPayload> for InputRecord {
    type Error = Error;

    fn try_from(payload: InputPayload) -> Result<Self> {
        let record = InputRecord {
            soil_type: payload.soil_type.parse()?,
            season: payload.season.parse()?,
            n: payload.n,
            p: payload.p,
            k: payload.k,
            location: payload.location,
            temperature: payload.temperature,
            humidity: payload.humidity,
            rainfall: payload.rainfall,
            ph: payload.ph.unwrap_or(DEFAULT_PH),
        };
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> InputPayload {
        InputPayload {
            soil_type: "Black".to_string(),
            season: "Kharif".to_string(),
            n: 90.0,
            p: 42.0,
            k: 43.0,
            location: "Nagpur".to_string(),
            temperature: 28.0,
            humidity: 70.0,
            rainfall: 120.0,
            ph: None,
        }
    }

    #[test]
    fn test_payload_into_record() {
        let record = InputRecord::try_from(payload()).unwrap();
        assert_eq!(record.soil_type, SoilType::Black);
        assert_eq!(record.season, Season::Kharif);
        assert_eq!(record.ph, DEFAULT_PH);
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("ALLUVIAL".parse::<SoilType>().unwrap(), SoilType::Alluvial);
        assert_eq!("summer".parse::<Season>().unwrap(), Season::Zaid);
    }

    #[test]
    fn test_unknown_soil_rejected() {
        let mut raw = payload();
        raw.soil_type = "Peat".to_string();
        let err = InputRecord::try_from(raw).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "soilType"));
    }

    #[test]
    fn test_nutrient_out_of_range_rejected() {
        let mut raw = payload();
        raw.k = 141.0;
        assert!(InputRecord::try_from(raw).is_err());

        let mut raw = payload();
        raw.n = -1.0;
        assert!(InputRecord::try_from(raw).is_err());
    }

    #[test]
    fn test_ph_out_of_range_rejected() {
        let mut raw = payload();
        raw.ph = Some(14.5);
        let err = InputRecord::try_from(raw).unwrap_err();
        assert!(err.is_client_error());
    }

    fn rejected_field(raw: InputPayload) -> String {
        match InputRecord::try_from(raw) {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_short_location_rejected() {
        let mut raw = payload();
        raw.location = " N ".to_string();
        assert_eq!(rejected_field(raw), "location");
    }

    #[test]
    fn test_humidity_out_of_range_rejected() {
        let mut raw = payload();
        raw.humidity = 100.5;
        assert_eq!(rejected_field(raw), "humidity");

        let mut raw = payload();
        raw.humidity = -0.1;
        assert_eq!(rejected_field(raw), "humidity");
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let mut raw = payload();
        raw.temperature = 61.0;
        assert_eq!(rejected_field(raw), "temperature");

        let mut raw = payload();
        raw.temperature = -10.5;
        assert_eq!(rejected_field(raw), "temperature");

        let mut raw = payload();
        raw.temperature = -10.0;
        assert!(InputRecord::try_from(raw).is_ok());
    }

    #[test]
    fn test_negative_rainfall_rejected() {
        let mut raw = payload();
        raw.rainfall = -1.0;
        assert_eq!(rejected_field(raw), "rainfall");

        let mut raw = payload();
        raw.rainfall = 0.0;
        assert!(InputRecord::try_from(raw).is_ok());
    }

    #[test]
    fn test_unknown_season_rejected() {
        let mut raw = payload();
        raw.season = "Monsoon".to_string();
        assert_eq!(rejected_field(raw), "season");
    }

    #[test]
    fn test_nan_rejected() {
        let mut raw = payload();
        raw.rainfall = f64::NAN;
        assert!(InputRecord::try_from(raw).is_err());
    }

    #[test]
    fn test_zero_nutrients_take_soil_defaults() {
        let mut raw = payload();
        raw.n = 0.0;
        raw.k = 0.0;
        let record = InputRecord::try_from(raw).unwrap();
        let resolved = record.with_soil_defaults();
        assert_eq!(resolved.n, 70.0);
        assert_eq!(resolved.p, 42.0);
        assert_eq!(resolved.k, 50.0);
        // original untouched
        assert_eq!(record.n, 0.0);
    }

    #[test]
    fn test_alternative_soil_differs() {
        for soil in SoilType::ALL {
            assert_ne!(soil.alternative(), soil);
        }
        assert_eq!(SoilType::Laterite.alternative(), SoilType::Black);
    }
}
