//! Linguistic feature extraction
//!
//! Counts pronoun, negation, absolutist and intensifier usage and buckets the
//! message into complexity and intensity levels. Extraction is pure and never
//! fails; empty input yields zeroed features.

use crate::config::LinguisticConfig;
use crate::vocabulary::{normalize_text, Vocabulary};
use mindscreen_core::{EmotionalIntensity, Error, Result, SentenceComplexity};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-message linguistic measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinguisticFeatures {
    pub first_person_count: usize,
    pub negation_count: usize,
    pub absolutist_count: usize,
    pub intensifier_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
    pub sentence_complexity: SentenceComplexity,
    pub emotional_intensity: EmotionalIntensity,

    /// Matched depression keywords per word
    pub depression_keyword_density: f64,

    pub semantic_coherence: f64,
    pub valence_score: f64,
}

impl LinguisticFeatures {
    /// Attach the measurements that depend on keyword matching and sentiment
    pub fn with_context(mut self, depression_keywords: usize, coherence: f64, valence: f64) -> Self {
        self.depression_keyword_density = if self.word_count == 0 {
            0.0
        } else {
            depression_keywords as f64 / self.word_count as f64
        };
        self.semantic_coherence = coherence.clamp(0.0, 1.0);
        self.valence_score = valence.clamp(0.0, 1.0);
        self
    }
}

/// Token-level extractor over a locale vocabulary
pub struct LinguisticExtractor {
    first_person: HashSet<String>,
    negations: HashSet<String>,
    absolutist: HashSet<String>,
    intensifiers: HashSet<String>,
    sentence_breaks: Regex,
    config: LinguisticConfig,
}

impl LinguisticExtractor {
    pub fn new(vocabulary: &Vocabulary, config: LinguisticConfig) -> Result<Self> {
        let sentence_breaks = Regex::new(r"[.!?]+")
            .map_err(|e| Error::config(format!("failed to build sentence splitter: {e}")))?;

        Ok(Self {
            first_person: vocabulary.first_person.iter().cloned().collect(),
            negations: vocabulary.negations.iter().cloned().collect(),
            absolutist: vocabulary.absolutist.iter().cloned().collect(),
            intensifiers: vocabulary.intensifiers.iter().cloned().collect(),
            sentence_breaks,
            config,
        })
    }

    pub fn extract(&self, text: &str) -> LinguisticFeatures {
        let normalized = normalize_text(text);
        let tokens: Vec<&str> = normalized
            .split_whitespace()
            .map(trim_token)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return LinguisticFeatures::default();
        }

        let count = |set: &HashSet<String>| tokens.iter().filter(|t| set.contains(**t)).count();

        let word_count = tokens.len();
        let sentence_count = self
            .sentence_breaks
            .split(&normalized)
            .filter(|s| !s.trim().is_empty())
            .count()
            .max(1);
        let avg_words_per_sentence = word_count as f64 / sentence_count as f64;

        let absolutist_count = count(&self.absolutist);
        let intensifier_count = count(&self.intensifiers);

        LinguisticFeatures {
            first_person_count: count(&self.first_person),
            negation_count: count(&self.negations),
            absolutist_count,
            intensifier_count,
            word_count,
            sentence_count,
            avg_words_per_sentence,
            sentence_complexity: self.complexity(avg_words_per_sentence),
            emotional_intensity: self.intensity(intensifier_count + absolutist_count, word_count),
            ..Default::default()
        }
    }

    fn complexity(&self, words_per_sentence: f64) -> SentenceComplexity {
        if words_per_sentence > self.config.complex_above {
            SentenceComplexity::Complex
        } else if words_per_sentence > self.config.moderate_above {
            SentenceComplexity::Moderate
        } else {
            SentenceComplexity::Simple
        }
    }

    fn intensity(&self, emphatic: usize, words: usize) -> EmotionalIntensity {
        let ratio = emphatic as f64 / words.max(1) as f64;
        if emphatic > self.config.intensity_high_count || ratio >= self.config.intensity_high_ratio
        {
            EmotionalIntensity::High
        } else if emphatic > 0 {
            EmotionalIntensity::Moderate
        } else {
            EmotionalIntensity::Low
        }
    }
}

/// Strip surrounding punctuation, keeping inner apostrophes and hyphens
fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}
