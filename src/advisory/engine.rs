use crate::advisory::{AdvisoryEvent, AdvisoryKind};
use crate::config::Config;
use crate::engine::{PredictionResult, Severity};
use crate::store::{PredictionRecord, RegionalAlert};

/// A non-Healthy disease seen this many times in the recent history
/// window triggers a repeated-detection advisory.
const REPEAT_THRESHOLD: usize = 3;

pub fn evaluate_advisories(
    crop_type: &str,
    result: &PredictionResult,
    recent_history: &[PredictionRecord],
    regional_alerts: &[RegionalAlert],
) -> Vec<AdvisoryEvent> {
    let mut events = Vec::new();

    if result.severity == Severity::High {
        events.push(AdvisoryEvent {
            kind: AdvisoryKind::HighSeverityDetected,
            crop_type: crop_type.to_string(),
            title: format!("High severity: {} on {crop_type}", result.disease_name),
            body: format!(
                "Detected with {:.2}% confidence. Act on the chemical and preventive steps promptly.",
                result.confidence
            ),
        });
    }

    if !result.is_healthy() {
        let repeats = recent_history
            .iter()
            .filter(|rec| rec.disease_name == result.disease_name)
            .count();
        if repeats >= REPEAT_THRESHOLD {
            events.push(AdvisoryEvent {
                kind: AdvisoryKind::RepeatedDetection,
                crop_type: crop_type.to_string(),
                title: format!("{} keeps recurring", result.disease_name),
                body: format!(
                    "{repeats} detections in your recent history. Consider rotating crops or consulting an extension officer."
                ),
            });
        }
    }

    for alert in regional_alerts {
        let crop_matches = alert
            .crop_type
            .as_deref()
            .map(|c| c == crop_type)
            .unwrap_or(true);
        if crop_matches {
            events.push(AdvisoryEvent {
                kind: AdvisoryKind::RegionalAlert,
                crop_type: crop_type.to_string(),
                title: format!("{} advisory for {}", alert.alert_type, alert.region),
                body: format!("[{}] {}", alert.severity, alert.message),
            });
        }
    }

    events
}

pub fn apply_advisory_rules(events: Vec<AdvisoryEvent>, config: &Config) -> Vec<AdvisoryEvent> {
    events
        .into_iter()
        .filter(|event| match event.kind {
            AdvisoryKind::HighSeverityDetected => config.advisories.rules.high_severity,
            AdvisoryKind::RepeatedDetection => config.advisories.rules.repeated_detection,
            AdvisoryKind::RegionalAlert => config.advisories.rules.regional_alert,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{apply_advisory_rules, evaluate_advisories};
    use crate::advisory::AdvisoryKind;
    use crate::config::Config;
    use crate::engine::recommendations::recommendations_for;
    use crate::engine::{PredictionResult, Severity};
    use crate::store::{PredictionRecord, RegionalAlert};

    fn result(disease: &str, severity: Severity) -> PredictionResult {
        PredictionResult {
            disease_name: disease.to_string(),
            confidence: 91.0,
            severity,
            recommendations: recommendations_for(disease),
        }
    }

    fn history_entry(disease: &str) -> PredictionRecord {
        PredictionRecord {
            id: None,
            user_id: "user-1".to_string(),
            crop_type: "Rice".to_string(),
            disease_name: disease.to_string(),
            confidence: 85.0,
            severity: Severity::Medium,
            temperature: None,
            humidity: None,
            rainfall: None,
            soil_type: None,
            soil_moisture: None,
            recommendations: None,
            created_at: None,
        }
    }

    fn alert(crop: Option<&str>) -> RegionalAlert {
        RegionalAlert {
            id: None,
            region: "Punjab".to_string(),
            crop_type: crop.map(str::to_string),
            alert_type: "disease_outbreak".to_string(),
            severity: "High".to_string(),
            message: "Outbreak reported".to_string(),
            is_active: Some(true),
            expires_at: None,
            created_at: None,
        }
    }

    #[test]
    fn high_severity_produces_event() {
        let events = evaluate_advisories("Rice", &result("Leaf Blast", Severity::High), &[], &[]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AdvisoryKind::HighSeverityDetected);
        assert_eq!(events[0].crop_type, "Rice");
    }

    #[test]
    fn repeated_disease_triggers_after_threshold() {
        let history = vec![
            history_entry("Brown Spot"),
            history_entry("Brown Spot"),
            history_entry("Brown Spot"),
            history_entry("Leaf Blast"),
        ];
        let events =
            evaluate_advisories("Rice", &result("Brown Spot", Severity::Medium), &history, &[]);
        assert!(events
            .iter()
            .any(|e| e.kind == AdvisoryKind::RepeatedDetection));

        let below = evaluate_advisories(
            "Rice",
            &result("Leaf Blast", Severity::Medium),
            &history,
            &[],
        );
        assert!(below.is_empty());
    }

    #[test]
    fn healthy_never_counts_as_repeated() {
        let history = vec![
            history_entry("Healthy"),
            history_entry("Healthy"),
            history_entry("Healthy"),
        ];
        let events = evaluate_advisories("Rice", &result("Healthy", Severity::Low), &history, &[]);
        assert!(events.is_empty());
    }

    #[test]
    fn regional_alerts_filter_by_crop() {
        let alerts = vec![alert(Some("Rice")), alert(Some("Wheat")), alert(None)];
        let events =
            evaluate_advisories("Rice", &result("Healthy", Severity::Low), &[], &alerts);
        let regional = events
            .iter()
            .filter(|e| e.kind == AdvisoryKind::RegionalAlert)
            .count();
        assert_eq!(regional, 2);
    }

    #[test]
    fn rules_filter_disabled_kinds() {
        let mut config = Config::default();
        config.advisories.rules.high_severity = false;
        let events = evaluate_advisories("Rice", &result("Leaf Blast", Severity::High), &[], &[]);
        assert!(apply_advisory_rules(events, &config).is_empty());
    }
}
