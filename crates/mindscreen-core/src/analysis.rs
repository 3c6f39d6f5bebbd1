//! Analysis output types shared by the pipeline, the responder and session analytics
//!
//! Everything here serializes to JSON with camelCase field names and lowercase
//! enum literals, which is the contract consumed by UI and session code.

use crate::types::{
    EmotionalIntensity, RiskLevel, SentenceComplexity, Sentiment, SeverityCategory,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum PHQ-9 total
pub const PHQ9_MAX: u8 = 27;

/// Number of PHQ-9 items
pub const PHQ9_ITEMS: usize = 9;

/// Clinical vocabulary category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Cognitive,
    Emotional,
    Behavioral,
    Somatic,
    Suicidal,
}

impl IndicatorCategory {
    pub const ALL: [IndicatorCategory; 5] = [
        Self::Cognitive,
        Self::Emotional,
        Self::Behavioral,
        Self::Somatic,
        Self::Suicidal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cognitive => "cognitive",
            Self::Emotional => "emotional",
            Self::Behavioral => "behavioral",
            Self::Somatic => "somatic",
            Self::Suicidal => "suicidal",
        }
    }
}

impl fmt::Display for IndicatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terms matched against the clinical vocabulary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAnalysis {
    /// Every matched indicator term, deduplicated, in vocabulary order
    pub depression_keywords: Vec<String>,

    /// Matched protective/positive terms
    pub positive_keywords: Vec<String>,

    /// Subset of depression keywords from the suicidal category
    pub risk_keywords: Vec<String>,

    /// Categories with at least one match
    pub categories: Vec<IndicatorCategory>,
}

impl KeywordAnalysis {
    /// Any risk keyword is a hard escalation signal
    pub fn has_risk(&self) -> bool {
        !self.risk_keywords.is_empty()
    }
}

/// Linguistic summary attached to every result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinguisticPatterns {
    pub first_person_count: usize,
    pub negation_count: usize,
    pub depression_keywords: Vec<String>,
    pub positive_keywords: Vec<String>,
    pub sentence_complexity: SentenceComplexity,
    pub emotional_intensity: EmotionalIntensity,
}

/// PHQ-9 style estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phq9Estimation {
    pub total_score: u8,
    pub item_scores: Vec<u8>,
    pub confidence_level: f64,
    pub severity_category: SeverityCategory,
    pub clinical_significance: bool,
}

impl Phq9Estimation {
    /// Build an estimate from per-item scores; items are clamped to 0-3 and the total to 27
    pub fn from_items(item_scores: Vec<u8>, confidence_level: f64) -> Self {
        let item_scores: Vec<u8> = item_scores.into_iter().map(|s| s.min(3)).collect();
        let total: u32 = item_scores.iter().map(|&s| u32::from(s)).sum();
        let total_score = total.min(u32::from(PHQ9_MAX)) as u8;

        Self {
            total_score,
            item_scores,
            confidence_level: confidence_level.clamp(0.0, 1.0),
            severity_category: SeverityCategory::from_phq9(total_score),
            clinical_significance: total_score >= 10,
        }
    }

    /// Estimate used when nothing could be derived
    pub fn empty(confidence_level: f64) -> Self {
        Self::from_items(vec![0; PHQ9_ITEMS], confidence_level)
    }
}

/// Clinical signal extracted from one message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalIndicators {
    pub phq9_score: u8,
    pub phq9_item_scores: Vec<u8>,
    pub symptom_clusters: Vec<IndicatorCategory>,
    pub risk_factors: Vec<String>,
    pub protective_factors: Vec<String>,
    pub severity_level: SeverityCategory,
    pub diagnostic_confidence: f64,
}

/// Intervention plan for a risk level, optionally tailored to a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TherapeuticRecommendations {
    pub primary_approach: String,
    pub interventions: Vec<String>,
    pub urgency: RiskLevel,
    pub cb_techniques: Vec<String>,
    pub behavioral_activation: Vec<String>,
    pub mindfulness_exercises: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub risk_mitigation: Vec<String>,
}

/// Result of assigning one feature vector to the nearest cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAssignment {
    pub cluster_id: usize,

    /// Gap-based confidence in [0.1, 0.99], or exactly 1.0 on a distance tie
    pub confidence: f64,

    pub timestamp: DateTime<Utc>,

    /// Standardized feature vector used for the assignment
    pub features: Vec<f64>,

    /// Euclidean distance to the assigned centroid
    pub distance_to_center: f64,
}

/// One learned behavioral cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterData {
    pub id: usize,
    pub centroid: Vec<f64>,
    pub size: usize,
    pub risk_level: RiskLevel,
    pub characteristics: Vec<String>,
    #[serde(rename = "avgPHQ9Score")]
    pub avg_phq9_score: f64,
    pub avg_confidence: f64,
}

/// Fit quality of the clustering model against labeled data
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetrics {
    pub sensitivity: f64,
    pub specificity: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,

    /// 95% Wald interval on accuracy
    pub confidence_interval: (f64, f64),

    pub area_under_curve: f64,
}

/// The pipeline's externally visible output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    pub risk_level: RiskLevel,

    /// Always within [0, 1]
    pub confidence: f64,

    /// Continuous rule-based risk score
    pub score: f64,

    /// Depression and positive terms, in that order
    pub keywords: Vec<String>,

    pub keyword_analysis: KeywordAnalysis,
    pub clinical_indicators: ClinicalIndicators,
    pub linguistic_patterns: LinguisticPatterns,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_assignment: Option<ClusterAssignment>,

    #[serde(rename = "phq9Estimation", skip_serializing_if = "Option::is_none")]
    pub phq9_estimation: Option<Phq9Estimation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapeutic_recommendations: Option<TherapeuticRecommendations>,

    /// Analysis latency in microseconds
    pub latency_us: u64,
}

impl AnalysisResult {
    /// Whether any suicidal/self-harm term matched
    pub fn has_risk_keywords(&self) -> bool {
        self.keyword_analysis.has_risk()
    }

    /// PHQ-9 total used for display: the attached estimate, else the keyword estimate
    pub fn phq9_total(&self) -> u8 {
        self.phq9_estimation
            .as_ref()
            .map(|e| e.total_score)
            .unwrap_or(self.clinical_indicators.phq9_score)
    }
}
