use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::engine::profiles::{crop_profile, supported_crops};
use crate::engine::{PredictionResult, Severity};
use crate::store::{CropDiseaseInfo, FarmerProfile, PredictionRecord, RegionalAlert};

fn severity_cell(severity: Severity) -> Cell {
    let cell = Cell::new(severity.to_string());
    match severity {
        Severity::Low => cell.fg(Color::Green),
        Severity::Medium => cell.fg(Color::Yellow),
        Severity::High => cell.fg(Color::Red),
    }
}

pub fn render_prediction(crop_type: &str, result: &PredictionResult) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Crop", "Diagnosis", "Confidence", "Severity"]);
    table.add_row(Row::from(vec![
        Cell::new(crop_type),
        Cell::new(&result.disease_name),
        Cell::new(format!("{:.2}%", result.confidence)),
        severity_cell(result.severity),
    ]));

    let mut out = table.to_string();
    let sections = [
        ("Preventive measures", &result.recommendations.preventive),
        ("Organic treatment", &result.recommendations.organic),
        ("Chemical treatment", &result.recommendations.chemical),
        ("Best practices", &result.recommendations.best_practices),
    ];
    for (label, items) in sections {
        out.push_str(&format!("\n{label}:\n"));
        for item in items {
            out.push_str(&format!("  - {item}\n"));
        }
    }
    out
}

pub fn render_history_table(records: &[PredictionRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Recorded At",
        "Crop",
        "Diagnosis",
        "Confidence",
        "Severity",
        "Temp °C",
        "Humidity %",
    ]);
    for rec in records {
        table.add_row(Row::from(vec![
            Cell::new(
                rec.created_at
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&rec.crop_type),
            Cell::new(&rec.disease_name),
            Cell::new(format!("{:.2}", rec.confidence)),
            severity_cell(rec.severity),
            Cell::new(
                rec.temperature
                    .map(|v| format!("{v:.1}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(
                rec.humidity
                    .map(|v| format!("{v:.0}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]));
    }
    table.to_string()
}

pub fn render_alerts_table(alerts: &[RegionalAlert]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Region", "Crop", "Type", "Severity", "Message"]);
    for alert in alerts {
        table.add_row(vec![
            alert.region.clone(),
            alert.crop_type.clone().unwrap_or_else(|| "all".to_string()),
            alert.alert_type.clone(),
            alert.severity.clone(),
            alert.message.clone(),
        ]);
    }
    table.to_string()
}

pub fn render_crops_table() -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Crop", "Base Confidence", "Candidate Diseases"]);
    for crop in supported_crops() {
        if let Some(profile) = crop_profile(crop) {
            table.add_row(vec![
                crop.to_string(),
                format!("{:.0}%", profile.base_confidence),
                profile.diseases.join(", "),
            ]);
        }
    }
    table.to_string()
}

pub fn render_diseases_table(entries: &[CropDiseaseInfo]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Crop", "Disease", "Description", "Symptoms"]);
    for entry in entries {
        table.add_row(vec![
            entry.crop_type.clone(),
            entry.disease_name.clone(),
            entry.description.clone().unwrap_or_else(|| "-".to_string()),
            entry
                .symptoms
                .as_ref()
                .map(|s| s.join("; "))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

pub fn render_profile_table(profile: &FarmerProfile) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    table.add_row(vec!["Name".to_string(), field(&profile.full_name)]);
    table.add_row(vec!["Location".to_string(), field(&profile.location)]);
    table.add_row(vec!["Primary crop".to_string(), field(&profile.primary_crop)]);
    table.add_row(vec!["Farm size".to_string(), field(&profile.farm_size)]);
    table.add_row(vec!["Phone".to_string(), field(&profile.phone)]);
    table.to_string()
}
