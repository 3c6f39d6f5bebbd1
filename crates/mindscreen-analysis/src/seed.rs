//! Labeled training samples and the built-in warm-up dataset

use crate::features::FeatureInput;
use mindscreen_core::{EmotionalIntensity, RiskLevel};
use serde::{Deserialize, Serialize};

/// One labeled example for clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: FeatureInput,

    /// Clinician PHQ-9 label, when available
    pub phq9_score: Option<f64>,

    pub risk_level: RiskLevel,
}

#[allow(clippy::too_many_arguments)]
fn sample(
    first_person: f64,
    negations: f64,
    words_per_sentence: f64,
    intensity: EmotionalIntensity,
    density: f64,
    coherence: f64,
    valence: f64,
    phq9: f64,
    risk_level: RiskLevel,
) -> TrainingSample {
    TrainingSample {
        features: FeatureInput {
            first_person_count: first_person,
            negation_count: negations,
            avg_words_per_sentence: words_per_sentence,
            emotional_intensity: intensity,
            keyword_density: density,
            semantic_coherence: coherence,
            valence,
        },
        phq9_score: Some(phq9),
        risk_level,
    }
}

/// Eight labeled profiles spanning the three risk tiers
pub fn seed_dataset() -> Vec<TrainingSample> {
    use EmotionalIntensity as I;
    use RiskLevel as R;

    vec![
        sample(12.0, 8.0, 20.0, I::High, 0.15, 0.4, 0.2, 18.0, R::High),
        sample(6.0, 4.0, 20.0, I::Moderate, 0.08, 0.6, 0.4, 12.0, R::Medium),
        sample(3.0, 1.0, 20.0, I::Low, 0.02, 0.8, 0.7, 4.0, R::Low),
        sample(10.0, 6.0, 22.0, I::High, 0.12, 0.5, 0.3, 16.0, R::High),
        sample(5.0, 3.0, 22.0, I::Moderate, 0.06, 0.65, 0.45, 11.0, R::Medium),
        sample(2.0, 0.0, 18.0, I::Low, 0.01, 0.85, 0.8, 2.0, R::Low),
        sample(8.0, 5.0, 24.0, I::Moderate, 0.09, 0.55, 0.35, 13.0, R::Medium),
        sample(1.0, 0.0, 17.0, I::Low, 0.005, 0.9, 0.85, 1.0, R::Low),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_covers_every_tier() {
        let seed = seed_dataset();
        assert_eq!(seed.len(), 8);
        for level in RiskLevel::ALL {
            assert!(seed.iter().filter(|s| s.risk_level == level).count() >= 2);
        }
    }

    #[test]
    fn test_labels_agree_with_phq9_bands() {
        for sample in seed_dataset() {
            let phq9 = sample.phq9_score.unwrap();
            assert_eq!(RiskLevel::from_phq9(phq9), sample.risk_level);
        }
    }
}
