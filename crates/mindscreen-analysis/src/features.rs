//! Clustering feature vectors and standardization

use crate::config::FeatureConfig;
use crate::linguistic::LinguisticFeatures;
use mindscreen_core::EmotionalIntensity;
use serde::{Deserialize, Serialize};

/// Number of clustering dimensions
pub const FEATURE_DIMENSIONS: usize = 6;

/// Raw measurements a feature vector is built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureInput {
    pub first_person_count: f64,
    pub negation_count: f64,
    pub avg_words_per_sentence: f64,
    pub emotional_intensity: EmotionalIntensity,
    pub keyword_density: f64,
    pub semantic_coherence: f64,
    pub valence: f64,
}

impl FeatureInput {
    /// Take a message's own measurements
    pub fn from_linguistic(features: &LinguisticFeatures) -> Self {
        Self {
            first_person_count: features.first_person_count as f64,
            negation_count: features.negation_count as f64,
            avg_words_per_sentence: features.avg_words_per_sentence,
            emotional_intensity: features.emotional_intensity,
            keyword_density: features.depression_keyword_density,
            semantic_coherence: features.semantic_coherence,
            valence: features.valence_score,
        }
    }

    /// Weighted 6-dimensional vector:
    /// pronouns, negations, keyword density, valence, complexity, intensity
    pub fn to_vector(&self, config: &FeatureConfig) -> [f64; FEATURE_DIMENSIONS] {
        let complexity = (self.avg_words_per_sentence / config.complexity_divisor
            + self.semantic_coherence * 0.5)
            .clamp(0.0, 1.0);
        let intensity = match self.emotional_intensity {
            EmotionalIntensity::Low => config.intensity.low,
            EmotionalIntensity::Moderate => config.intensity.moderate,
            EmotionalIntensity::High => config.intensity.high,
        };

        let raw = [
            self.first_person_count,
            self.negation_count,
            self.keyword_density,
            self.valence,
            complexity,
            intensity,
        ];
        let weights = config.weights.as_array();

        let mut vector = [0.0; FEATURE_DIMENSIONS];
        for (i, slot) in vector.iter_mut().enumerate() {
            *slot = raw[i] * weights[i];
        }
        vector
    }
}

/// Per-dimension mean and population standard deviation from a training set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    mean: [f64; FEATURE_DIMENSIONS],
    std_dev: [f64; FEATURE_DIMENSIONS],
}

impl Standardizer {
    /// Fit statistics; a zero deviation is stored as 1 so that dimension passes through centred
    pub fn fit(points: &[[f64; FEATURE_DIMENSIONS]]) -> Self {
        let mut mean = [0.0; FEATURE_DIMENSIONS];
        let mut std_dev = [1.0; FEATURE_DIMENSIONS];
        if points.is_empty() {
            return Self { mean, std_dev };
        }

        let n = points.len() as f64;
        for d in 0..FEATURE_DIMENSIONS {
            mean[d] = points.iter().map(|p| p[d]).sum::<f64>() / n;
            let variance = points.iter().map(|p| (p[d] - mean[d]).powi(2)).sum::<f64>() / n;
            let sd = variance.sqrt();
            std_dev[d] = if sd > 0.0 { sd } else { 1.0 };
        }

        Self { mean, std_dev }
    }

    pub fn transform(&self, point: &[f64; FEATURE_DIMENSIONS]) -> Vec<f64> {
        (0..FEATURE_DIMENSIONS)
            .map(|d| (point[d] - self.mean[d]) / self.std_dev[d])
            .collect()
    }

    pub fn mean(&self) -> &[f64; FEATURE_DIMENSIONS] {
        &self.mean
    }

    pub fn std_dev(&self) -> &[f64; FEATURE_DIMENSIONS] {
        &self.std_dev
    }
}
