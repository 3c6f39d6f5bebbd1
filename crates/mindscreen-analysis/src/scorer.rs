//! Rule-based risk scorer
//!
//! Always computed, and the result callers fall back to whenever the
//! clustering model is unavailable.

use crate::config::ScoringConfig;
use crate::keywords::{build_automaton, matched_patterns};
use crate::linguistic::LinguisticFeatures;
use crate::vocabulary::{normalize_text, Vocabulary};
use aho_corasick::AhoCorasick;
use mindscreen_core::{KeywordAnalysis, Phq9Estimation, Result, RiskLevel, Sentiment};
use serde::{Deserialize, Serialize};

/// Output of the rule-based scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAssessment {
    pub score: f64,
    pub risk_level: RiskLevel,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub high_risk_phrases: Vec<String>,
    pub medium_risk_phrases: Vec<String>,
}

struct PhraseSet {
    automaton: AhoCorasick,
    phrases: Vec<String>,
}

impl PhraseSet {
    fn new(phrases: &[String], what: &str) -> Result<Self> {
        Ok(Self {
            automaton: build_automaton(phrases, what)?,
            phrases: phrases.to_vec(),
        })
    }

    fn find(&self, text: &str) -> Vec<String> {
        matched_patterns(&self.automaton, text)
            .into_iter()
            .map(|i| self.phrases[i].clone())
            .collect()
    }
}

pub struct RiskScorer {
    high_risk: PhraseSet,
    medium_risk: PhraseSet,
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(vocabulary: &Vocabulary, config: ScoringConfig) -> Result<Self> {
        Ok(Self {
            high_risk: PhraseSet::new(&vocabulary.high_risk_phrases, "high-risk phrase")?,
            medium_risk: PhraseSet::new(&vocabulary.medium_risk_phrases, "medium-risk phrase")?,
            config,
        })
    }

    pub fn score(
        &self,
        text: &str,
        features: &LinguisticFeatures,
        keywords: &KeywordAnalysis,
        phq9: &Phq9Estimation,
    ) -> RuleAssessment {
        let normalized = normalize_text(text);
        let high_risk_phrases = self.high_risk.find(&normalized);
        let medium_risk_phrases = self.medium_risk.find(&normalized);
        let cfg = &self.config;

        let depression = keywords.depression_keywords.len();
        let positive = keywords.positive_keywords.len();

        let mut score = cfg.first_person_weight * features.first_person_count as f64
            + cfg.negation_weight * features.negation_count as f64
            + cfg.depression_keyword_weight * depression as f64
            - cfg.positive_keyword_weight * positive as f64
            + cfg.high_risk_phrase_bonus * high_risk_phrases.len() as f64
            + cfg.medium_risk_phrase_bonus * medium_risk_phrases.len() as f64;
        if keywords.has_risk() {
            score += cfg.risk_keyword_bonus;
        }

        let phq9_total = phq9.total_score;
        let (risk_level, sentiment) = if keywords.has_risk() {
            (RiskLevel::High, Sentiment::Concerning)
        } else if cfg.high.reached(phq9_total, score, depression) {
            (RiskLevel::High, Sentiment::Concerning)
        } else if cfg.medium.reached(phq9_total, score, depression) {
            (RiskLevel::Medium, Sentiment::Negative)
        } else if cfg.low.reached(phq9_total, score, depression) {
            (RiskLevel::Low, balance(depression, positive))
        } else if positive > 0 {
            (RiskLevel::Low, Sentiment::Positive)
        } else {
            (RiskLevel::Low, Sentiment::Neutral)
        };

        let indicators = depression + positive + high_risk_phrases.len() + medium_risk_phrases.len();
        let confidence = (cfg.confidence_base + cfg.confidence_step * indicators as f64)
            .min(cfg.confidence_cap)
            .clamp(0.0, 1.0);

        RuleAssessment {
            score,
            risk_level,
            sentiment,
            confidence,
            high_risk_phrases,
            medium_risk_phrases,
        }
    }
}

/// Sentiment for a low-tier message that still carries some signal
fn balance(depression: usize, positive: usize) -> Sentiment {
    if depression > positive {
        Sentiment::Negative
    } else if positive > depression {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}
