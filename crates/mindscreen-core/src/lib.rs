//! Mindscreen Core
//!
//! Core types and error handling shared across Mindscreen components.
//!
//! This crate provides:
//! - Risk, sentiment and severity enums with their lowercase wire literals
//! - The `AnalysisResult` contract and its nested clinical structures
//! - Clustering output types (`ClusterData`, `ClusterAssignment`, `ValidationMetrics`)
//! - Error types and result handling

pub mod analysis;
pub mod error;
pub mod types;

pub use analysis::{
    AnalysisResult, ClinicalIndicators, ClusterAssignment, ClusterData, IndicatorCategory,
    KeywordAnalysis, LinguisticPatterns, Phq9Estimation, TherapeuticRecommendations,
    ValidationMetrics, PHQ9_ITEMS, PHQ9_MAX,
};
pub use error::{Error, Result};
pub use types::{
    ChatMessage, EmotionalIntensity, RiskLevel, SentenceComplexity, Sentiment, SeverityCategory,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{AnalysisResult, ClusterAssignment, ClusterData, ValidationMetrics};
    pub use crate::error::{Error, Result};
    pub use crate::types::{ChatMessage, RiskLevel, Sentiment};
}
