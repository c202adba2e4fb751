use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Four categorized advice lists returned for a disease. Field names
/// serialize to the same keys the `predictions.recommendations` JSON
/// column already holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationBundle {
    pub preventive: Vec<String>,
    pub organic: Vec<String>,
    pub chemical: Vec<String>,
    #[serde(rename = "bestPractices")]
    pub best_practices: Vec<String>,
}

fn bundle(
    preventive: &[&str],
    organic: &[&str],
    chemical: &[&str],
    best_practices: &[&str],
) -> RecommendationBundle {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    RecommendationBundle {
        preventive: owned(preventive),
        organic: owned(organic),
        chemical: owned(chemical),
        best_practices: owned(best_practices),
    }
}

static RECOMMENDATIONS: Lazy<BTreeMap<&'static str, RecommendationBundle>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    map.insert(
        "Early Blight",
        bundle(
            &[
                "Rotate crops every 2-3 years",
                "Remove infected plant debris",
                "Ensure proper spacing for air circulation",
            ],
            &[
                "Neem oil spray (2-3 tablespoons per gallon)",
                "Copper-based fungicides",
                "Baking soda solution (1 tbsp per gallon)",
            ],
            &[
                "Chlorothalonil - Apply every 7-10 days",
                "Mancozeb - Preventive application",
                "Azoxystrobin - Systemic protection",
            ],
            &[
                "Water at base of plants early morning",
                "Apply mulch to prevent soil splash",
                "Plant resistant varieties like Mountain Merit",
            ],
        ),
    );
    map.insert(
        "Late Blight",
        bundle(
            &[
                "Plant certified disease-free seeds",
                "Avoid overhead irrigation",
                "Remove volunteer potato plants nearby",
            ],
            &[
                "Copper hydroxide spray",
                "Bacillus subtilis products",
                "Compost tea foliar spray",
            ],
            &[
                "Metalaxyl-based fungicides",
                "Cymoxanil application",
                "Phosphorous acid treatments",
            ],
            &[
                "Monitor weather conditions closely",
                "Scout fields daily during humid periods",
                "Destroy infected plants immediately",
            ],
        ),
    );
    map.insert(
        "Brown Spot",
        bundle(
            &[
                "Use certified disease-free seeds",
                "Maintain balanced fertilization",
                "Ensure proper water management",
            ],
            &[
                "Trichoderma-based products",
                "Pseudomonas fluorescens spray",
                "Neem cake application to soil",
            ],
            &[
                "Propiconazole spray",
                "Tricyclazole treatment",
                "Carbendazim seed treatment",
            ],
            &[
                "Maintain optimal plant nutrition",
                "Avoid drought stress conditions",
                "Treat seeds before planting",
            ],
        ),
    );
    map.insert(
        "Leaf Blast",
        bundle(
            &[
                "Plant resistant varieties",
                "Avoid excessive nitrogen application",
                "Maintain proper plant spacing",
            ],
            &[
                "Bacillus subtilis applications",
                "Trichoderma viride treatment",
                "Silicon-based foliar spray",
            ],
            &[
                "Tricyclazole - Most effective",
                "Isoprothiolane spray",
                "Carbendazim application",
            ],
            &[
                "Monitor nursery beds carefully",
                "Apply balanced fertilizers",
                "Maintain proper water levels",
            ],
        ),
    );
    map.insert(
        "Rust",
        bundle(
            &[
                "Plant rust-resistant varieties",
                "Avoid late planting",
                "Eliminate volunteer wheat plants",
            ],
            &[
                "Sulfur dust application",
                "Garlic extract spray",
                "Milk solution spray (40%)",
            ],
            &[
                "Propiconazole fungicide",
                "Tebuconazole treatment",
                "Triadimefon spray",
            ],
            &[
                "Monitor from jointing stage",
                "Apply fungicides at first sign",
                "Rotate with non-host crops",
            ],
        ),
    );
    map.insert(
        "Powdery Mildew",
        bundle(
            &[
                "Plant resistant varieties",
                "Avoid dense planting",
                "Balance nitrogen application",
            ],
            &[
                "Sulfur-based fungicides",
                "Potassium bicarbonate spray",
                "Milk spray solution (40%)",
            ],
            &[
                "Triadimefon application",
                "Propiconazole spray",
                "Tebuconazole treatment",
            ],
            &[
                "Remove crop residue after harvest",
                "Ensure good air circulation",
                "Scout fields regularly",
            ],
        ),
    );
    map.insert(
        "Healthy",
        bundle(
            &[
                "Continue current management practices",
                "Maintain regular monitoring schedule",
                "Keep fields clean and weed-free",
            ],
            &[
                "Apply compost for soil health",
                "Use cover crops in rotation",
                "Maintain beneficial insect populations",
            ],
            &[
                "No chemical treatment needed",
                "Consider preventive applications during high-risk periods",
            ],
            &[
                "Document successful practices",
                "Monitor weather for disease pressure",
                "Maintain optimal plant nutrition",
            ],
        ),
    );
    map
});

static DEFAULT_RECOMMENDATIONS: Lazy<RecommendationBundle> = Lazy::new(|| {
    bundle(
        &[
            "Implement crop rotation",
            "Use disease-free planting material",
            "Maintain proper field sanitation",
        ],
        &[
            "Apply neem-based products",
            "Use copper fungicides",
            "Implement biological control agents",
        ],
        &[
            "Consult local agricultural extension",
            "Use registered fungicides as per label",
            "Follow integrated pest management",
        ],
        &[
            "Monitor crops regularly",
            "Maintain records of disease incidence",
            "Consult with agricultural experts",
        ],
    )
});

/// Looks up the bundle for a disease name, falling back to the default
/// bundle for any disease without a specific entry.
pub fn recommendations_for(disease_name: &str) -> RecommendationBundle {
    RECOMMENDATIONS
        .get(disease_name)
        .unwrap_or(&DEFAULT_RECOMMENDATIONS)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::recommendations_for;

    #[test]
    fn known_disease_returns_specific_bundle() {
        let rust = recommendations_for("Rust");
        assert!(!rust.preventive.is_empty());
        assert!(!rust.organic.is_empty());
        assert!(!rust.chemical.is_empty());
        assert!(!rust.best_practices.is_empty());
        assert!(rust.preventive[0].contains("rust-resistant"));
    }

    #[test]
    fn unknown_disease_returns_default_bundle() {
        let unknown = recommendations_for("Some Unknown Disease");
        assert_eq!(unknown.preventive[0], "Implement crop rotation");
        assert_eq!(unknown.preventive.len(), 3);
        assert_eq!(unknown.organic.len(), 3);
        assert_eq!(unknown.chemical.len(), 3);
        assert_eq!(unknown.best_practices.len(), 3);
    }

    #[test]
    fn bundle_serializes_with_camel_case_best_practices() {
        let json = serde_json::to_value(recommendations_for("Healthy")).expect("serialize");
        assert!(json.get("bestPractices").is_some());
        assert!(json.get("best_practices").is_none());
    }
}
