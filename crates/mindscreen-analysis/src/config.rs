//! Configuration for the analysis pipeline
//!
//! Every numeric policy constant lives here with a serde default, so a YAML
//! file only needs to name the values it overrides.

use mindscreen_core::{Error, Result, Sentiment};
use serde::{Deserialize, Serialize};

/// Top-level analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub blending: BlendingConfig,

    #[serde(default)]
    pub linguistic: LinguisticConfig,

    #[serde(default)]
    pub locale: LocaleConfig,
}

impl AnalysisConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid analysis config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject settings the algorithms cannot run with
    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        if !(0.0..=1.0).contains(&self.blending.confidence_threshold) {
            return Err(Error::config(
                "blending.confidence_threshold must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Rule-based scorer weights and tier cutoffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_first_person_weight")]
    pub first_person_weight: f64,

    #[serde(default = "default_negation_weight")]
    pub negation_weight: f64,

    #[serde(default = "default_depression_keyword_weight")]
    pub depression_keyword_weight: f64,

    #[serde(default = "default_positive_keyword_weight")]
    pub positive_keyword_weight: f64,

    #[serde(default = "default_high_risk_phrase_bonus")]
    pub high_risk_phrase_bonus: f64,

    #[serde(default = "default_medium_risk_phrase_bonus")]
    pub medium_risk_phrase_bonus: f64,

    #[serde(default = "default_risk_keyword_bonus")]
    pub risk_keyword_bonus: f64,

    #[serde(default = "default_high_tier")]
    pub high: TierCutoffs,

    #[serde(default = "default_medium_tier")]
    pub medium: TierCutoffs,

    #[serde(default = "default_low_tier")]
    pub low: TierCutoffs,

    #[serde(default = "default_confidence_base")]
    pub confidence_base: f64,

    #[serde(default = "default_confidence_step")]
    pub confidence_step: f64,

    #[serde(default = "default_confidence_cap")]
    pub confidence_cap: f64,
}

/// A tier is reached when any one of its cutoffs is met
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierCutoffs {
    pub phq9: u8,
    pub score: f64,
    pub keywords: usize,
}

impl TierCutoffs {
    pub fn reached(&self, phq9: u8, score: f64, keywords: usize) -> bool {
        phq9 >= self.phq9 || score >= self.score || keywords >= self.keywords
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            first_person_weight: default_first_person_weight(),
            negation_weight: default_negation_weight(),
            depression_keyword_weight: default_depression_keyword_weight(),
            positive_keyword_weight: default_positive_keyword_weight(),
            high_risk_phrase_bonus: default_high_risk_phrase_bonus(),
            medium_risk_phrase_bonus: default_medium_risk_phrase_bonus(),
            risk_keyword_bonus: default_risk_keyword_bonus(),
            high: default_high_tier(),
            medium: default_medium_tier(),
            low: default_low_tier(),
            confidence_base: default_confidence_base(),
            confidence_step: default_confidence_step(),
            confidence_cap: default_confidence_cap(),
        }
    }
}

/// Feature weights and scalars for the clustering feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Per-dimension weights, in feature order
    #[serde(default = "default_feature_weights")]
    pub weights: FeatureWeights,

    #[serde(default = "default_intensity_scalars")]
    pub intensity: IntensityScalars,

    /// Words per sentence that map to a complexity of 1.0 before coherence is added
    #[serde(default = "default_complexity_divisor")]
    pub complexity_divisor: f64,

    /// Imputed when coherence cannot be measured from a single message
    #[serde(default = "default_semantic_coherence")]
    pub default_semantic_coherence: f64,

    #[serde(default = "default_valence")]
    pub valence: ValenceScores,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            weights: default_feature_weights(),
            intensity: default_intensity_scalars(),
            complexity_divisor: default_complexity_divisor(),
            default_semantic_coherence: default_semantic_coherence(),
            valence: default_valence(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub first_person: f64,
    pub negation: f64,
    pub keyword_density: f64,
    pub valence: f64,
    pub complexity: f64,
    pub emotional_intensity: f64,
}

impl FeatureWeights {
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.first_person,
            self.negation,
            self.keyword_density,
            self.valence,
            self.complexity,
            self.emotional_intensity,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityScalars {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValenceScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub concerning: f64,
}

impl ValenceScores {
    pub fn for_sentiment(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
            Sentiment::Concerning => self.concerning,
        }
    }
}

/// K-means settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_iterations")]
    pub iterations: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    #[serde(default = "default_confidence_ceiling")]
    pub confidence_ceiling: f64,

    /// Mean PHQ-9 assumed for a cluster whose members carry no label, by cluster index
    #[serde(default = "default_fallback_phq9")]
    pub fallback_phq9: Vec<f64>,

    /// Descriptors attached to clusters, by cluster index modulo the list length
    #[serde(default = "default_characteristics")]
    pub characteristics: Vec<Vec<String>>,
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::config("clustering.k must be at least 1"));
        }
        if self.confidence_floor > self.confidence_ceiling {
            return Err(Error::config(
                "clustering.confidence_floor must not exceed confidence_ceiling",
            ));
        }
        Ok(())
    }

    pub fn fallback_phq9_for(&self, cluster_id: usize) -> f64 {
        if self.fallback_phq9.is_empty() {
            return 0.0;
        }
        self.fallback_phq9[cluster_id % self.fallback_phq9.len()]
    }

    pub fn characteristics_for(&self, cluster_id: usize) -> Vec<String> {
        if self.characteristics.is_empty() {
            return Vec::new();
        }
        self.characteristics[cluster_id % self.characteristics.len()].clone()
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            iterations: default_iterations(),
            seed: default_seed(),
            confidence_floor: default_confidence_floor(),
            confidence_ceiling: default_confidence_ceiling(),
            fallback_phq9: default_fallback_phq9(),
            characteristics: default_characteristics(),
        }
    }
}

/// Rule/cluster reconciliation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendingConfig {
    /// Above this assignment confidence the cluster risk is adopted outright
    #[serde(default = "default_blend_threshold")]
    pub confidence_threshold: f64,

    #[serde(default = "default_cluster_weight")]
    pub cluster_weight: f64,

    #[serde(default = "default_base_weight")]
    pub base_weight: f64,

    #[serde(default = "default_high_cutoff")]
    pub high_cutoff: f64,

    #[serde(default = "default_medium_cutoff")]
    pub medium_cutoff: f64,
}

impl Default for BlendingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_blend_threshold(),
            cluster_weight: default_cluster_weight(),
            base_weight: default_base_weight(),
            high_cutoff: default_high_cutoff(),
            medium_cutoff: default_medium_cutoff(),
        }
    }
}

/// Linguistic bucketing thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinguisticConfig {
    /// Words per sentence above which a message is complex
    #[serde(default = "default_complex_above")]
    pub complex_above: f64,

    /// Words per sentence above which a message is moderate
    #[serde(default = "default_moderate_above")]
    pub moderate_above: f64,

    /// Emphatic word count above which intensity is high
    #[serde(default = "default_intensity_high_count")]
    pub intensity_high_count: usize,

    /// Emphatic words per word at or above which intensity is high
    #[serde(default = "default_intensity_high_ratio")]
    pub intensity_high_ratio: f64,

    /// Characters searched on each side of a PHQ-9 match for a frequency qualifier
    #[serde(default = "default_qualifier_window")]
    pub qualifier_window: usize,
}

impl Default for LinguisticConfig {
    fn default() -> Self {
        Self {
            complex_above: default_complex_above(),
            moderate_above: default_moderate_above(),
            intensity_high_count: default_intensity_high_count(),
            intensity_high_ratio: default_intensity_high_ratio(),
            qualifier_window: default_qualifier_window(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "default_locale")]
    pub default: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: default_locale(),
        }
    }
}

// Default value functions
fn default_first_person_weight() -> f64 {
    0.5
}

fn default_negation_weight() -> f64 {
    1.0
}

fn default_depression_keyword_weight() -> f64 {
    2.0
}

fn default_positive_keyword_weight() -> f64 {
    1.5
}

fn default_high_risk_phrase_bonus() -> f64 {
    5.0
}

fn default_medium_risk_phrase_bonus() -> f64 {
    1.5
}

fn default_risk_keyword_bonus() -> f64 {
    10.0
}

fn default_high_tier() -> TierCutoffs {
    TierCutoffs {
        phq9: 15,
        score: 7.0,
        keywords: 4,
    }
}

fn default_medium_tier() -> TierCutoffs {
    TierCutoffs {
        phq9: 10,
        score: 3.5,
        keywords: 2,
    }
}

fn default_low_tier() -> TierCutoffs {
    TierCutoffs {
        phq9: 5,
        score: 1.5,
        keywords: 1,
    }
}

fn default_confidence_base() -> f64 {
    0.6
}

fn default_confidence_step() -> f64 {
    0.05
}

fn default_confidence_cap() -> f64 {
    0.95
}

fn default_feature_weights() -> FeatureWeights {
    FeatureWeights {
        first_person: 0.15,
        negation: 0.18,
        keyword_density: 0.22,
        valence: 0.20,
        complexity: 0.12,
        emotional_intensity: 0.13,
    }
}

fn default_intensity_scalars() -> IntensityScalars {
    IntensityScalars {
        low: 0.2,
        moderate: 0.5,
        high: 0.8,
    }
}

fn default_complexity_divisor() -> f64 {
    20.0
}

fn default_semantic_coherence() -> f64 {
    0.7
}

fn default_valence() -> ValenceScores {
    ValenceScores {
        positive: 0.7,
        neutral: 0.5,
        negative: 0.3,
        concerning: 0.2,
    }
}

fn default_k() -> usize {
    4
}

fn default_iterations() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_confidence_floor() -> f64 {
    0.1
}

fn default_confidence_ceiling() -> f64 {
    0.99
}

fn default_fallback_phq9() -> Vec<f64> {
    vec![8.0, 12.0, 16.0, 4.0]
}

fn default_characteristics() -> Vec<Vec<String>> {
    [
        [
            "High self-referential language",
            "moderate linguistic complexity",
            "moderate emotional intensity",
        ],
        [
            "Negative cognitive patterns",
            "simple linguistic complexity",
            "high emotional intensity",
        ],
        [
            "Depression-related vocabulary",
            "complex linguistic complexity",
            "low emotional intensity",
        ],
        [
            "Positive language patterns",
            "moderate linguistic complexity",
            "low emotional intensity",
        ],
    ]
    .iter()
    .map(|set| set.iter().map(|s| s.to_string()).collect())
    .collect()
}

fn default_blend_threshold() -> f64 {
    0.7
}

fn default_cluster_weight() -> f64 {
    0.7
}

fn default_base_weight() -> f64 {
    0.3
}

fn default_high_cutoff() -> f64 {
    2.5
}

fn default_medium_cutoff() -> f64 {
    1.5
}

fn default_complex_above() -> f64 {
    15.0
}

fn default_moderate_above() -> f64 {
    8.0
}

fn default_intensity_high_count() -> usize {
    2
}

fn default_intensity_high_ratio() -> f64 {
    0.25
}

fn default_qualifier_window() -> usize {
    40
}

fn default_locale() -> String {
    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.clustering.k, 4);
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(config.blending.confidence_threshold, 0.7);
        assert_eq!(config.scoring.high.score, 7.0);
        assert_eq!(config.locale.default, "en");
        let weights: f64 = config.features.weights.as_array().iter().sum();
        assert!((weights - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
clustering:
  k: 3
  seed: 7
blending:
  confidence_threshold: 0.8
"#;
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.clustering.k, 3);
        assert_eq!(config.clustering.seed, 7);
        assert_eq!(config.clustering.iterations, 10);
        assert_eq!(config.blending.confidence_threshold, 0.8);
        assert_eq!(config.blending.cluster_weight, 0.7);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(AnalysisConfig::from_yaml("clustering:\n  k: 0\n").is_err());
        assert!(AnalysisConfig::from_yaml("blending:\n  confidence_threshold: 1.5\n").is_err());
    }

    #[test]
    fn test_cluster_index_lookups_wrap() {
        let config = ClusteringConfig::default();
        assert_eq!(config.fallback_phq9_for(2), 16.0);
        assert_eq!(config.fallback_phq9_for(5), 12.0);
        assert_eq!(config.characteristics_for(4)[0], "High self-referential language");
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        std::fs::write(&path, "locale:\n  default: en-MY\n").unwrap();
        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.locale.default, "en-MY");
    }

    #[test]
    fn test_tier_cutoffs_any_condition() {
        let tier = default_medium_tier();
        assert!(tier.reached(10, 0.0, 0));
        assert!(tier.reached(0, 3.5, 0));
        assert!(tier.reached(0, 0.0, 2));
        assert!(!tier.reached(9, 3.4, 1));
    }
}
