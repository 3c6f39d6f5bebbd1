//! Keyword and clinical indicator matching (Aho-Corasick over the locale vocabulary)

use crate::vocabulary::{normalize_text, Vocabulary};
use aho_corasick::AhoCorasick;
use mindscreen_core::{Error, IndicatorCategory, KeywordAnalysis, Result};
use std::collections::BTreeSet;

/// Build a case-insensitive automaton over a term list
pub(crate) fn build_automaton(terms: &[String], what: &str) -> Result<AhoCorasick> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(terms)
        .map_err(|e| Error::config(format!("failed to build {what} matcher: {e}")))
}

/// Indices of every pattern found anywhere in the text, overlaps included
pub(crate) fn matched_patterns(automaton: &AhoCorasick, text: &str) -> BTreeSet<usize> {
    automaton
        .find_overlapping_iter(text)
        .map(|m| m.pattern().as_usize())
        .collect()
}

/// Matches indicator and protective vocabularies against a message
pub struct KeywordMatcher {
    indicators: AhoCorasick,
    indicator_terms: Vec<(IndicatorCategory, String)>,
    positive: AhoCorasick,
    positive_terms: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        let indicator_terms: Vec<(IndicatorCategory, String)> = IndicatorCategory::ALL
            .iter()
            .flat_map(|&category| {
                vocabulary
                    .indicator_terms(category)
                    .iter()
                    .map(move |term| (category, term.clone()))
            })
            .collect();

        let terms: Vec<String> = indicator_terms.iter().map(|(_, t)| t.clone()).collect();
        let indicators = build_automaton(&terms, "indicator")?;
        let positive = build_automaton(&vocabulary.positive, "positive term")?;

        Ok(Self {
            indicators,
            indicator_terms,
            positive,
            positive_terms: vocabulary.positive.clone(),
        })
    }

    pub fn analyze(&self, text: &str) -> KeywordAnalysis {
        let normalized = normalize_text(text);
        let mut analysis = KeywordAnalysis::default();

        for index in matched_patterns(&self.indicators, &normalized) {
            let (category, term) = &self.indicator_terms[index];

            if !analysis.depression_keywords.contains(term) {
                analysis.depression_keywords.push(term.clone());
            }
            if *category == IndicatorCategory::Suicidal && !analysis.risk_keywords.contains(term) {
                analysis.risk_keywords.push(term.clone());
            }
            if !analysis.categories.contains(category) {
                analysis.categories.push(*category);
            }
        }

        for index in matched_patterns(&self.positive, &normalized) {
            let term = &self.positive_terms[index];
            if !analysis.positive_keywords.contains(term) {
                analysis.positive_keywords.push(term.clone());
            }
        }

        analysis
    }
}
