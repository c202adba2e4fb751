use anyhow::Result;

use crate::store::{PredictionRecord, RegionalAlert};

pub fn history_to_csv(records: &[PredictionRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "recorded_at",
        "crop_type",
        "disease_name",
        "confidence",
        "severity",
        "temperature",
        "humidity",
        "rainfall",
        "soil_type",
        "soil_moisture",
    ])?;
    for rec in records {
        writer.write_record([
            rec.created_at
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            rec.crop_type.clone(),
            rec.disease_name.clone(),
            format!("{:.2}", rec.confidence),
            rec.severity.to_string(),
            rec.temperature.map(|v| format!("{v:.1}")).unwrap_or_default(),
            rec.humidity.map(|v| format!("{v:.1}")).unwrap_or_default(),
            rec.rainfall.map(|v| format!("{v:.1}")).unwrap_or_default(),
            rec.soil_type.clone().unwrap_or_default(),
            rec.soil_moisture
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn alerts_to_csv(alerts: &[RegionalAlert]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["region", "crop_type", "alert_type", "severity", "message"])?;
    for alert in alerts {
        writer.write_record([
            alert.region.clone(),
            alert.crop_type.clone().unwrap_or_default(),
            alert.alert_type.clone(),
            alert.severity.clone(),
            alert.message.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
