pub mod cache;
pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{PredictionResult, Severity, SoilReading, WeatherReading};

/// One row of the remote `predictions` table. Optional fields are either
/// server-generated (`id`, `created_at`) or nullable columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub crop_type: String,
    pub disease_name: String,
    pub confidence: f64,
    pub severity: Severity,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    pub soil_type: Option<String>,
    pub soil_moisture: Option<f64>,
    pub recommendations: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    /// Assembles the row to persist for a fresh engine result together
    /// with the readings that produced it.
    pub fn from_result(
        user_id: impl Into<String>,
        crop_type: impl Into<String>,
        result: &PredictionResult,
        weather: &WeatherReading,
        soil: &SoilReading,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            crop_type: crop_type.into(),
            disease_name: result.disease_name.clone(),
            confidence: result.confidence,
            severity: result.severity,
            temperature: Some(weather.temperature),
            humidity: Some(weather.humidity),
            rainfall: Some(weather.rainfall),
            soil_type: Some(soil.soil_type.to_string()),
            soil_moisture: Some(soil.moisture),
            recommendations: serde_json::to_value(&result.recommendations).ok(),
            created_at: None,
        }
    }
}

/// Row of the `profiles` table, keyed by user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmerProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub primary_crop: Option<String>,
    pub farm_size: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial profile update; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_crop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.location.is_none()
            && self.primary_crop.is_none()
            && self.farm_size.is_none()
            && self.phone.is_none()
    }
}

/// Regional advisory row from the `alerts` table. Severity stays a plain
/// string; the table is written by external tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalAlert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub region: String,
    pub crop_type: Option<String>,
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Encyclopedia row from the `crop_disease_info` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropDiseaseInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub crop_type: String,
    pub disease_name: String,
    pub description: Option<String>,
    pub symptoms: Option<Vec<String>>,
    pub preventive_measures: Option<Vec<String>>,
    pub organic_treatment: Option<Vec<String>>,
    pub chemical_treatment: Option<Vec<String>>,
    pub best_practices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::PredictionRecord;
    use crate::engine::predictor::{predict_with, SequenceSource};
    use crate::engine::{SoilReading, SoilType, WeatherReading};

    #[test]
    fn record_round_trips_through_json() {
        let weather = WeatherReading {
            temperature: 24.0,
            humidity: 70.0,
            rainfall: 12.0,
        };
        let soil = SoilReading {
            soil_type: SoilType::Clay,
            moisture: 55.0,
        };
        let mut rng = SequenceSource::new(vec![0.0, 0.5]);
        let result = predict_with("Tomato", &weather, &soil, &mut rng);
        let record = PredictionRecord::from_result("user-1", "Tomato", &result, &weather, &soil);

        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("id").is_none(), "unset id must not be sent");
        assert_eq!(json["severity"], "Medium");
        assert_eq!(json["soil_type"], "Clay");
        assert!(json["recommendations"].get("bestPractices").is_some());

        let parsed: PredictionRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.disease_name, record.disease_name);
        assert_eq!(parsed.confidence, record.confidence);
    }
}
