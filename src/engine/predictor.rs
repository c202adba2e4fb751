use rand::Rng;

use crate::engine::profiles::{resolve_profile, HEALTHY};
use crate::engine::recommendations::recommendations_for;
use crate::engine::{PredictionResult, Severity, SoilReading, WeatherReading};

/// Source of uniform draws from [0, 1). The rule engine takes this as a
/// capability so tests can substitute a fixed sequence and assert exact
/// outcomes instead of statistical ones.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Default source backed by the thread-local generator. No seeding or
/// reproducibility guarantee is made.
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen()
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "sequence source needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// Runs the rule table for one reading set and returns the assembled
/// result. Never fails: an unrecognized crop type degrades to the Tomato
/// profile, and out-of-range readings produce whatever the formulas yield.
pub fn predict_with(
    crop_type: &str,
    weather: &WeatherReading,
    soil: &SoilReading,
    rng: &mut dyn RandomSource,
) -> PredictionResult {
    let profile = resolve_profile(crop_type);
    let count = profile.diseases.len();

    // Initial draw excludes the trailing "Healthy" entry.
    let mut index = (rng.next_unit() * (count - 1) as f64).floor() as usize;

    // Ordered rules; a later rule that fires supersedes the earlier result.
    // Probabilistic draws happen only when the guarding condition holds, so
    // the draw order per invocation is stable.
    if weather.humidity > 80.0 && weather.temperature > 25.0 {
        // Hedge against a list layout where the initial draw could land on
        // "Healthy"; redundant with the exclusion above but kept.
        index = index.min(count.saturating_sub(2));
    }
    if weather.humidity < 60.0
        && (20.0..=30.0).contains(&weather.temperature)
        && rng.next_unit() > 0.6
    {
        index = count - 1;
    }
    if weather.rainfall > 50.0 && rng.next_unit() > 0.5 {
        index = 0;
    }

    let disease_name = profile.diseases[index];

    let mut confidence = profile.base_confidence + (rng.next_unit() * 10.0 - 5.0);
    if soil.moisture > 40.0 && soil.moisture < 70.0 {
        confidence += 2.0;
    }
    let confidence = round2(confidence.clamp(80.0, 95.0));

    let severity = classify_severity(disease_name, confidence, weather);

    PredictionResult {
        disease_name: disease_name.to_string(),
        confidence,
        severity,
        recommendations: recommendations_for(disease_name),
    }
}

/// Same as [`predict_with`] using the thread-local generator.
pub fn predict(crop_type: &str, weather: &WeatherReading, soil: &SoilReading) -> PredictionResult {
    predict_with(crop_type, weather, soil, &mut ThreadRngSource)
}

pub fn classify_severity(disease_name: &str, confidence: f64, weather: &WeatherReading) -> Severity {
    if disease_name == HEALTHY {
        Severity::Low
    } else if confidence >= 90.0 || (weather.humidity > 85.0 && weather.temperature > 28.0) {
        Severity::High
    } else if confidence >= 85.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{classify_severity, predict, predict_with, SequenceSource};
    use crate::engine::profiles::{crop_profile, HEALTHY};
    use crate::engine::{Severity, SoilReading, SoilType, WeatherReading};

    fn weather(temperature: f64, humidity: f64, rainfall: f64) -> WeatherReading {
        WeatherReading {
            temperature,
            humidity,
            rainfall,
        }
    }

    fn soil(moisture: f64) -> SoilReading {
        SoilReading {
            soil_type: SoilType::Loamy,
            moisture,
        }
    }

    // Weather that triggers no adjustment rule and therefore draws only
    // the index and confidence values.
    fn quiet_weather() -> WeatherReading {
        weather(22.0, 70.0, 10.0)
    }

    #[test]
    fn confidence_stays_in_bounds_with_two_decimals() {
        for crop in ["Tomato", "Rice", "Wheat", "Maize", "Cotton", "Nonsense"] {
            for _ in 0..500 {
                let result = predict(crop, &weather(35.0, 95.0, 120.0), &soil(55.0));
                assert!(
                    (80.0..=95.0).contains(&result.confidence),
                    "confidence {} out of range",
                    result.confidence
                );
                let scaled = result.confidence * 100.0;
                assert!(
                    (scaled - scaled.round()).abs() < 1e-9,
                    "confidence {} has more than two decimals",
                    result.confidence
                );
            }
        }
    }

    #[test]
    fn healthy_always_maps_to_low_severity() {
        for _ in 0..2_000 {
            let result = predict("Rice", &weather(25.0, 50.0, 0.0), &soil(50.0));
            if result.disease_name == HEALTHY {
                assert_eq!(result.severity, Severity::Low);
            }
        }
    }

    #[test]
    fn disease_always_comes_from_the_crops_own_list() {
        let wheat = crop_profile("Wheat").expect("wheat profile");
        for _ in 0..1_000 {
            let result = predict("Wheat", &weather(28.0, 90.0, 80.0), &soil(30.0));
            assert!(wheat.diseases.contains(&result.disease_name.as_str()));
        }
    }

    #[test]
    fn unknown_crop_predicts_from_tomato_list() {
        let tomato = crop_profile("Tomato").expect("tomato profile");
        for _ in 0..200 {
            let result = predict("Sugarcane", &quiet_weather(), &soil(50.0));
            assert!(tomato.diseases.contains(&result.disease_name.as_str()));
        }
    }

    #[test]
    fn dry_mild_conditions_force_healthy_about_forty_percent() {
        let conditions = weather(25.0, 50.0, 0.0);
        let trials = 10_000;
        let healthy = (0..trials)
            .filter(|_| predict("Tomato", &conditions, &soil(50.0)).disease_name == HEALTHY)
            .count();
        let ratio = healthy as f64 / trials as f64;
        assert!(
            (0.36..=0.44).contains(&ratio),
            "healthy ratio {ratio} outside expected band around 0.40"
        );
    }

    #[test]
    fn heavy_rainfall_biases_toward_first_listed_disease() {
        // Forced to index 0 with p=0.5; the initial uniform draw over the
        // four Tomato diseases adds 0.5 * 0.25, so expect about 0.625.
        let conditions = weather(22.0, 70.0, 80.0);
        let trials = 10_000;
        let first = (0..trials)
            .filter(|_| predict("Tomato", &conditions, &soil(50.0)).disease_name == "Early Blight")
            .count();
        let ratio = first as f64 / trials as f64;
        assert!(
            (0.58..=0.67).contains(&ratio),
            "first-disease ratio {ratio} outside expected band around 0.625"
        );
    }

    #[test]
    fn severity_tiers_follow_confidence_thresholds() {
        let calm = weather(20.0, 50.0, 0.0);
        assert_eq!(classify_severity("Rust", 91.0, &calm), Severity::High);
        assert_eq!(classify_severity("Rust", 86.0, &calm), Severity::Medium);
        assert_eq!(classify_severity("Rust", 81.0, &calm), Severity::Low);
    }

    #[test]
    fn humid_heat_escalates_severity_regardless_of_confidence() {
        let muggy = weather(29.0, 90.0, 0.0);
        assert_eq!(classify_severity("Rust", 81.0, &muggy), Severity::High);
        // Healthy wins over the environmental escalation.
        assert_eq!(classify_severity(HEALTHY, 94.0, &muggy), Severity::Low);
    }

    #[test]
    fn fixed_sequence_forces_healthy_through_dry_rule() {
        // Draws: index, dry-rule (>0.6 forces Healthy), confidence.
        let mut rng = SequenceSource::new(vec![0.0, 0.7, 0.5]);
        let result = predict_with("Tomato", &weather(25.0, 50.0, 0.0), &soil(50.0), &mut rng);
        assert_eq!(result.disease_name, HEALTHY);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn moisture_in_band_adds_exactly_two_confidence_points() {
        // Identical draws; only soil moisture differs. Tomato base 85 with
        // a 0.5 confidence draw lands mid-range, so no clamping applies.
        let mut rng_dry = SequenceSource::new(vec![0.0, 0.5]);
        let mut rng_band = SequenceSource::new(vec![0.0, 0.5]);
        let dry = predict_with("Tomato", &quiet_weather(), &soil(10.0), &mut rng_dry);
        let band = predict_with("Tomato", &quiet_weather(), &soil(50.0), &mut rng_band);
        assert!((band.confidence - dry.confidence - 2.0).abs() < 1e-9);
    }

    #[test]
    fn moisture_bonus_is_strict_at_both_ends() {
        for boundary in [40.0, 70.0] {
            let mut rng_edge = SequenceSource::new(vec![0.0, 0.5]);
            let mut rng_dry = SequenceSource::new(vec![0.0, 0.5]);
            let edge = predict_with("Tomato", &quiet_weather(), &soil(boundary), &mut rng_edge);
            let dry = predict_with("Tomato", &quiet_weather(), &soil(0.0), &mut rng_dry);
            assert_eq!(edge.confidence, dry.confidence, "boundary {boundary}");
        }
    }

    #[test]
    fn rainfall_rule_overrides_dry_rule() {
        // Dry rule fires (draw 0.7) then the rainfall rule fires (draw
        // 0.6), so the later rule wins and index 0 is selected.
        let mut rng = SequenceSource::new(vec![0.9, 0.7, 0.6, 0.5]);
        let result = predict_with("Rice", &weather(25.0, 50.0, 60.0), &soil(50.0), &mut rng);
        assert_eq!(result.disease_name, "Brown Spot");
    }

    #[test]
    fn known_disease_carries_its_specific_bundle() {
        // Index draw 0.0 selects "Rust" for Wheat.
        let mut rng = SequenceSource::new(vec![0.0, 0.5]);
        let result = predict_with("Wheat", &quiet_weather(), &soil(50.0), &mut rng);
        assert_eq!(result.disease_name, "Rust");
        assert!(result.recommendations.preventive[0].contains("rust-resistant"));
    }
}
