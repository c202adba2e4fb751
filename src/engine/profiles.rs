use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::debug;

/// Sentinel entry closing every candidate list.
pub const HEALTHY: &str = "Healthy";

/// Unrecognized crop types silently resolve to this profile.
pub const FALLBACK_CROP: &str = "Tomato";

/// Per-crop reference data: an ordered candidate disease list ending in
/// "Healthy", plus the starting confidence before randomized adjustment.
#[derive(Debug, Clone, Copy)]
pub struct CropProfile {
    pub diseases: &'static [&'static str],
    pub base_confidence: f64,
}

static CROP_PROFILES: Lazy<BTreeMap<&'static str, CropProfile>> = Lazy::new(|| {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "Tomato",
        CropProfile {
            diseases: &[
                "Early Blight",
                "Late Blight",
                "Leaf Mold",
                "Septoria Leaf Spot",
                HEALTHY,
            ],
            base_confidence: 85.0,
        },
    );
    profiles.insert(
        "Rice",
        CropProfile {
            diseases: &[
                "Brown Spot",
                "Leaf Blast",
                "Bacterial Blight",
                "Sheath Blight",
                HEALTHY,
            ],
            base_confidence: 88.0,
        },
    );
    profiles.insert(
        "Wheat",
        CropProfile {
            diseases: &["Rust", "Powdery Mildew", "Septoria", "Tan Spot", HEALTHY],
            base_confidence: 86.0,
        },
    );
    profiles.insert(
        "Maize",
        CropProfile {
            diseases: &[
                "Northern Corn Leaf Blight",
                "Common Rust",
                "Gray Leaf Spot",
                HEALTHY,
            ],
            base_confidence: 84.0,
        },
    );
    profiles.insert(
        "Cotton",
        CropProfile {
            diseases: &[
                "Bacterial Blight",
                "Alternaria Leaf Spot",
                "Grey Mildew",
                HEALTHY,
            ],
            base_confidence: 87.0,
        },
    );
    profiles
});

pub fn crop_profile(crop_type: &str) -> Option<&'static CropProfile> {
    CROP_PROFILES.get(crop_type)
}

/// Resolves the profile for a crop type, falling back to Tomato when the
/// key is absent. The fallback is deliberate (an unknown crop degrades to
/// plausible output rather than an error) and is logged so it can be told
/// apart from a genuine Tomato request.
pub fn resolve_profile(crop_type: &str) -> &'static CropProfile {
    match CROP_PROFILES.get(crop_type) {
        Some(profile) => profile,
        None => {
            debug!("unrecognized crop type {crop_type:?}, using {FALLBACK_CROP} profile");
            CROP_PROFILES
                .get(FALLBACK_CROP)
                .expect("fallback crop profile must exist")
        }
    }
}

pub fn supported_crops() -> Vec<&'static str> {
    CROP_PROFILES.keys().copied().collect()
}

/// Serializable view of the reference table, for the `crops` command and
/// the `/v1/crops` route.
#[derive(Debug, Clone, Serialize)]
pub struct CropCatalogEntry {
    pub crop_type: String,
    pub diseases: Vec<String>,
    pub base_confidence: f64,
}

pub fn crop_catalog() -> Vec<CropCatalogEntry> {
    CROP_PROFILES
        .iter()
        .map(|(crop, profile)| CropCatalogEntry {
            crop_type: crop.to_string(),
            diseases: profile.diseases.iter().map(|d| d.to_string()).collect(),
            base_confidence: profile.base_confidence,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{crop_profile, resolve_profile, supported_crops, HEALTHY};

    #[test]
    fn every_candidate_list_ends_with_healthy() {
        for crop in supported_crops() {
            let profile = crop_profile(crop).expect("listed crop must have a profile");
            assert_eq!(profile.diseases.last(), Some(&HEALTHY), "crop {crop}");
            assert!(profile.diseases.len() >= 2, "crop {crop}");
        }
    }

    #[test]
    fn covers_the_five_supported_crops() {
        let crops = supported_crops();
        for expected in ["Tomato", "Rice", "Wheat", "Maize", "Cotton"] {
            assert!(crops.contains(&expected), "missing crop {expected}");
        }
    }

    #[test]
    fn unknown_crop_resolves_to_tomato() {
        let fallback = resolve_profile("Dragonfruit");
        let tomato = crop_profile("Tomato").expect("tomato profile");
        assert_eq!(fallback.diseases, tomato.diseases);
        assert_eq!(fallback.base_confidence, tomato.base_confidence);
    }
}
