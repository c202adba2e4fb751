pub mod predictor;
pub mod profiles;
pub mod recommendations;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::recommendations::RecommendationBundle;

/// Weather readings for one prediction request. Built by the caller,
/// discarded after use; the persisted copy lives in the store row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SoilReading {
    pub soil_type: SoilType,
    pub moisture: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SoilType {
    Clay,
    Sandy,
    Loamy,
    Silty,
    Peaty,
    Chalky,
}

impl SoilType {
    pub const ALL: [SoilType; 6] = [
        SoilType::Clay,
        SoilType::Sandy,
        SoilType::Loamy,
        SoilType::Silty,
        SoilType::Peaty,
        SoilType::Chalky,
    ];
}

impl Display for SoilType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Clay => "Clay",
            Self::Sandy => "Sandy",
            Self::Loamy => "Loamy",
            Self::Silty => "Silty",
            Self::Peaty => "Peaty",
            Self::Chalky => "Chalky",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown soil type: {0}")]
pub struct SoilTypeParseError(pub String);

impl FromStr for SoilType {
    type Err = SoilTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clay" => Ok(Self::Clay),
            "sandy" | "sand" => Ok(Self::Sandy),
            "loamy" | "loam" => Ok(Self::Loamy),
            "silty" | "silt" => Ok(Self::Silty),
            "peaty" | "peat" => Ok(Self::Peaty),
            "chalky" | "chalk" => Ok(Self::Chalky),
            _ => Err(SoilTypeParseError(s.to_string())),
        }
    }
}

/// Urgency tier for a detected condition. Serialized capitalized to match
/// the values persisted in the `predictions` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown severity: {0}")]
pub struct SeverityParseError(pub String);

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(SeverityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub disease_name: String,
    pub confidence: f64,
    pub severity: Severity,
    pub recommendations: RecommendationBundle,
}

impl PredictionResult {
    pub fn is_healthy(&self) -> bool {
        self.disease_name == profiles::HEALTHY
    }
}
