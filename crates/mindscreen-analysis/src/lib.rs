//! Mindscreen Analysis
//!
//! Depression-risk analysis for single chat messages.
//!
//! The pipeline combines:
//! - Linguistic features (pronouns, negations, absolutist words, intensity)
//! - Clinical vocabulary matching and a PHQ-9 style estimate
//! - A rule-based risk score, always computed and used as the fallback
//! - A k-means model over weighted, standardized feature vectors
//! - Blending of the rule-based and cluster verdicts
//!
//! Vocabulary and intervention tables are per-locale YAML data.

pub mod blender;
pub mod clustering;
pub mod config;
pub mod features;
pub mod keywords;
pub mod linguistic;
pub mod phq9;
pub mod pipeline;
pub mod recommendations;
pub mod scorer;
pub mod seed;
pub mod validation;
pub mod vocabulary;

pub use blender::RiskBlender;
pub use clustering::{ClusteringEngine, KMeansModel, ModelState};
pub use config::{
    AnalysisConfig, BlendingConfig, ClusteringConfig, FeatureConfig, LinguisticConfig,
    ScoringConfig,
};
pub use features::{FeatureInput, Standardizer, FEATURE_DIMENSIONS};
pub use keywords::KeywordMatcher;
pub use linguistic::{LinguisticExtractor, LinguisticFeatures};
pub use phq9::{estimate_from_cluster, reported_estimate, Phq9Estimator};
pub use pipeline::{AnalysisPipeline, AnalysisPipelineBuilder};
pub use recommendations::InterventionTable;
pub use scorer::{RiskScorer, RuleAssessment};
pub use seed::{seed_dataset, TrainingSample};
pub use validation::ConfusionMatrix;
pub use vocabulary::{Vocabulary, BUILTIN_LOCALES};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clustering::ClusteringEngine;
    pub use crate::config::AnalysisConfig;
    pub use crate::pipeline::AnalysisPipeline;
    pub use crate::vocabulary::Vocabulary;
    pub use mindscreen_core::prelude::*;
}
