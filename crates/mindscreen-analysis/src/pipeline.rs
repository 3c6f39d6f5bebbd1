//! The analysis pipeline
//!
//! text -> linguistic features + keyword match + PHQ-9 estimate -> rule-based
//! score -> feature vector -> cluster assignment -> blend -> `AnalysisResult`.
//!
//! Every stage is infallible once the pipeline is built. When the clustering
//! engine is untrained the rule-based result is returned with a keyword PHQ-9
//! estimate and a base intervention plan. With a cluster, the reported PHQ-9
//! estimate never falls below the keyword estimate.

use crate::blender::RiskBlender;
use crate::clustering::ClusteringEngine;
use crate::config::AnalysisConfig;
use crate::features::FeatureInput;
use crate::keywords::KeywordMatcher;
use crate::linguistic::LinguisticExtractor;
use crate::phq9::{estimate_from_cluster, reported_estimate, Phq9Estimator};
use crate::recommendations::InterventionTable;
use crate::scorer::{RiskScorer, RuleAssessment};
use crate::vocabulary::Vocabulary;
use mindscreen_core::{
    AnalysisResult, ClinicalIndicators, IndicatorCategory, KeywordAnalysis, LinguisticPatterns,
    Phq9Estimation, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const SUICIDAL_IDEATION_FACTOR: &str = "suicidal ideation language";
const HIGH_RISK_PHRASING_FACTOR: &str = "high-risk phrasing";

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    vocabulary: Vocabulary,
    extractor: LinguisticExtractor,
    matcher: KeywordMatcher,
    phq9: Phq9Estimator,
    scorer: RiskScorer,
    engine: Arc<ClusteringEngine>,
    blender: RiskBlender,
    interventions: InterventionTable,
}

impl AnalysisPipeline {
    pub fn builder() -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::new()
    }

    /// Pipeline over the built-in tables for the configured locale, untrained
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Train the clustering engine on the seed dataset if it is not trained yet
    pub fn warm_up(&self) -> Result<()> {
        self.engine.ensure_trained().map(|_| ())
    }

    pub fn engine(&self) -> &Arc<ClusteringEngine> {
        &self.engine
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn locale(&self) -> &str {
        &self.vocabulary.locale
    }

    /// Full analysis with cluster blending when a model is available
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let start = Instant::now();
        let (base, input) = self.rule_based_parts(text);

        let assignment = self.engine.assign(&input);
        let cluster = assignment
            .as_ref()
            .and_then(|a| self.engine.cluster(a.cluster_id));

        let keyword_estimate = base.phq9_estimation.clone();
        let mut result = self.blender.blend(base, assignment, cluster.as_ref().map(|c| c.risk_level));

        let characteristics = cluster
            .as_ref()
            .map(|c| c.characteristics.clone())
            .unwrap_or_default();
        result.phq9_estimation = match (result.cluster_assignment.as_ref(), keyword_estimate) {
            (Some(assignment), Some(keyword)) => Some(reported_estimate(
                keyword,
                estimate_from_cluster(cluster.as_ref(), assignment),
            )),
            (Some(assignment), None) => Some(estimate_from_cluster(cluster.as_ref(), assignment)),
            (None, keyword) => keyword,
        };
        result.therapeutic_recommendations =
            Some(self.interventions.plan(result.risk_level, &characteristics));
        result.latency_us = start.elapsed().as_micros() as u64;

        debug!(
            risk = %result.risk_level,
            sentiment = %result.sentiment,
            cluster = ?result.cluster_assignment.as_ref().map(|a| a.cluster_id),
            latency_us = result.latency_us,
            "message analyzed"
        );
        result
    }

    /// Rule-based analysis only; the deterministic fallback path
    pub fn analyze_rule_based(&self, text: &str) -> AnalysisResult {
        let start = Instant::now();
        let (mut result, _) = self.rule_based_parts(text);
        result.therapeutic_recommendations = Some(self.interventions.plan(result.risk_level, &[]));
        result.latency_us = start.elapsed().as_micros() as u64;
        result
    }

    fn rule_based_parts(&self, text: &str) -> (AnalysisResult, FeatureInput) {
        let features = self.extractor.extract(text);
        let keywords = self.matcher.analyze(text);
        let phq9 = self.phq9.estimate(text);
        let assessment = self.scorer.score(text, &features, &keywords, &phq9);

        let valence = self
            .config
            .features
            .valence
            .for_sentiment(assessment.sentiment);
        let features = features.with_context(
            keywords.depression_keywords.len(),
            self.config.features.default_semantic_coherence,
            valence,
        );
        let input = FeatureInput::from_linguistic(&features);

        let clinical_indicators = self.clinical_indicators(&keywords, &phq9, &assessment);
        let linguistic_patterns = LinguisticPatterns {
            first_person_count: features.first_person_count,
            negation_count: features.negation_count,
            depression_keywords: keywords.depression_keywords.clone(),
            positive_keywords: keywords.positive_keywords.clone(),
            sentence_complexity: features.sentence_complexity,
            emotional_intensity: features.emotional_intensity,
        };

        let result = AnalysisResult {
            sentiment: assessment.sentiment,
            risk_level: assessment.risk_level,
            confidence: assessment.confidence,
            score: assessment.score,
            keywords: keywords
                .depression_keywords
                .iter()
                .chain(&keywords.positive_keywords)
                .cloned()
                .collect(),
            keyword_analysis: keywords,
            clinical_indicators,
            linguistic_patterns,
            cluster_assignment: None,
            phq9_estimation: Some(phq9),
            therapeutic_recommendations: None,
            latency_us: 0,
        };

        (result, input)
    }

    fn clinical_indicators(
        &self,
        keywords: &KeywordAnalysis,
        phq9: &Phq9Estimation,
        assessment: &RuleAssessment,
    ) -> ClinicalIndicators {
        let mut risk_factors: Vec<String> = keywords
            .categories
            .iter()
            .map(|&category| self.vocabulary.risk_factor(category))
            .collect();

        if keywords.has_risk() {
            risk_factors.push(SUICIDAL_IDEATION_FACTOR.to_string());
        }
        for phrase in &assessment.high_risk_phrases {
            risk_factors.push(format!("{HIGH_RISK_PHRASING_FACTOR}: {phrase}"));
        }

        let symptom_clusters: Vec<IndicatorCategory> = IndicatorCategory::ALL
            .into_iter()
            .filter(|c| keywords.categories.contains(c))
            .collect();

        ClinicalIndicators {
            phq9_score: phq9.total_score,
            phq9_item_scores: phq9.item_scores.clone(),
            symptom_clusters,
            risk_factors,
            protective_factors: keywords.positive_keywords.clone(),
            severity_level: phq9.severity_category,
            diagnostic_confidence: phq9.confidence_level,
        }
    }
}

/// Builder for [`AnalysisPipeline`]; unset tables come from the configured locale
#[derive(Default)]
pub struct AnalysisPipelineBuilder {
    config: AnalysisConfig,
    locale: Option<String>,
    vocabulary: Option<Vocabulary>,
    interventions: Option<InterventionTable>,
    engine: Option<Arc<ClusteringEngine>>,
}

impl AnalysisPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the configured locale for built-in tables
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn interventions(mut self, interventions: InterventionTable) -> Self {
        self.interventions = Some(interventions);
        self
    }

    /// Share an existing engine instead of creating a fresh untrained one
    pub fn engine(mut self, engine: Arc<ClusteringEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<AnalysisPipeline> {
        let config = self.config;
        config.validate()?;

        let locale = self.locale.unwrap_or_else(|| config.locale.default.clone());
        let vocabulary = match self.vocabulary {
            Some(v) => v,
            None => Vocabulary::builtin(&locale)?,
        };
        let interventions = match self.interventions {
            Some(t) => t,
            None => InterventionTable::builtin(&locale)?,
        };
        let engine = match self.engine {
            Some(engine) => engine,
            None => Arc::new(ClusteringEngine::new(
                config.clustering.clone(),
                config.features.clone(),
            )?),
        };

        Ok(AnalysisPipeline {
            extractor: LinguisticExtractor::new(&vocabulary, config.linguistic.clone())?,
            matcher: KeywordMatcher::new(&vocabulary)?,
            phq9: Phq9Estimator::new(&vocabulary, config.linguistic.qualifier_window)?,
            scorer: RiskScorer::new(&vocabulary, config.scoring.clone())?,
            blender: RiskBlender::new(config.blending.clone()),
            engine,
            interventions,
            vocabulary,
            config,
        })
    }
}
