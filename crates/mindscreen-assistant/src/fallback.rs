//! Locale response tables and deterministic fallback replies
//!
//! The table supplies three things: context cue lists, the technique and
//! intervention lists injected into prompts, and the canned replies served
//! whenever generation is unavailable.

use crate::context::{ContextClassifier, MessageContext};
use crate::response::{ResponseSource, RiskAssessment, TherapeuticResponse};
use mindscreen_core::{Error, Result, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const EMBEDDED_EN: &str = include_str!("../data/en/responses.yaml");
const EMBEDDED_EN_MY: &str = include_str!("../data/en-MY/responses.yaml");

/// Confidence reported on fallback risk assessments
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Techniques and interventions suggested to the model per risk level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    #[serde(default)]
    pub techniques: Vec<String>,
    #[serde(default)]
    pub interventions: Vec<String>,
}

/// Metadata attached to fallback replies per risk level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelGuidance {
    pub reasoning: String,
    pub supportive_elements: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub follow_up_suggestions: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTable {
    pub locale: String,
    #[serde(default)]
    pub contexts: BTreeMap<MessageContext, Vec<String>>,
    pub approaches: BTreeMap<RiskLevel, Approach>,
    pub guidance: BTreeMap<RiskLevel, LevelGuidance>,
    pub crisis_resources: Vec<String>,
    pub safety_plan: Vec<String>,
    pub responses: BTreeMap<MessageContext, BTreeMap<RiskLevel, Vec<String>>>,
}

impl ResponseTable {
    pub fn builtin(locale: &str) -> Result<Self> {
        let source = match locale {
            "en" => EMBEDDED_EN,
            "en-MY" | "en_MY" => EMBEDDED_EN_MY,
            other => {
                return Err(Error::config(format!(
                    "no embedded response table for locale '{other}'"
                )))
            }
        };
        Self::from_yaml(source)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid response table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Every context needs a reply for every level, and crisis support must exist
    fn validate(&self) -> Result<()> {
        for context in MessageContext::ALL {
            for level in RiskLevel::ALL {
                let present = self
                    .responses
                    .get(&context)
                    .and_then(|levels| levels.get(&level))
                    .is_some_and(|candidates| !candidates.is_empty());
                if !present {
                    return Err(Error::config(format!(
                        "response table '{}' has no {level} reply for context '{context}'",
                        self.locale
                    )));
                }
            }
        }

        for level in RiskLevel::ALL {
            if !self.guidance.contains_key(&level) || !self.approaches.contains_key(&level) {
                return Err(Error::config(format!(
                    "response table '{}' is missing guidance for {level}",
                    self.locale
                )));
            }
        }

        if self.crisis_resources.is_empty() || self.safety_plan.is_empty() {
            return Err(Error::config(format!(
                "response table '{}' must list crisis resources and a safety plan",
                self.locale
            )));
        }

        Ok(())
    }

    pub fn classifier(&self) -> Result<ContextClassifier> {
        ContextClassifier::new(&self.contexts)
    }

    pub fn approach(&self, level: RiskLevel) -> Approach {
        self.approaches.get(&level).cloned().unwrap_or_default()
    }

    fn guidance_for(&self, level: RiskLevel) -> LevelGuidance {
        self.guidance.get(&level).cloned().unwrap_or_default()
    }

    /// Deterministic reply: candidate index is the message's character count
    /// modulo the number of candidates
    pub fn fallback(
        &self,
        message: &str,
        context: MessageContext,
        level: RiskLevel,
    ) -> TherapeuticResponse {
        let candidates = self
            .responses
            .get(&context)
            .and_then(|levels| levels.get(&level))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let content = match candidates.len() {
            0 => String::new(),
            n => candidates[message.chars().count() % n].clone(),
        };

        let guidance = self.guidance_for(level);
        let mut response = TherapeuticResponse {
            content,
            therapeutic_techniques: self.approach(level).techniques,
            supportive_elements: guidance.supportive_elements,
            recommended_actions: guidance.recommended_actions,
            coping_strategies: guidance.coping_strategies,
            risk_assessment: RiskAssessment {
                level,
                reasoning: guidance.reasoning,
                confidence: FALLBACK_CONFIDENCE,
                safety_plan: Vec::new(),
            },
            follow_up_suggestions: guidance.follow_up_suggestions,
            resource_recommendations: guidance.resources,
            context,
            source: ResponseSource::Fallback,
        };

        self.ensure_crisis_support(&mut response);
        response
    }

    /// High-risk responses always carry the crisis resources and a safety plan
    pub fn ensure_crisis_support(&self, response: &mut TherapeuticResponse) {
        if response.risk_assessment.level != RiskLevel::High {
            return;
        }
        if response.risk_assessment.safety_plan.is_empty() {
            response.risk_assessment.safety_plan = self.safety_plan.clone();
        }
        for resource in &self.crisis_resources {
            if !response.resource_recommendations.contains(resource) {
                response.resource_recommendations.push(resource.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResponseTable {
        ResponseTable::builtin("en").unwrap()
    }

    #[test]
    fn test_builtin_tables_complete() {
        for locale in ["en", "en-MY"] {
            let table = ResponseTable::builtin(locale).unwrap();
            for context in MessageContext::ALL {
                for level in RiskLevel::ALL {
                    assert!(!table.fallback("x", context, level).content.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let table = table();
        let a = table.fallback("hello", MessageContext::Greeting, RiskLevel::Low);
        let b = table.fallback("hello", MessageContext::Greeting, RiskLevel::Low);
        assert_eq!(a, b);

        // two low greeting candidates: even and odd lengths differ
        let even = table.fallback("hi", MessageContext::Greeting, RiskLevel::Low);
        let odd = table.fallback("hey", MessageContext::Greeting, RiskLevel::Low);
        assert_ne!(even.content, odd.content);
    }

    #[test]
    fn test_high_risk_carries_crisis_support() {
        let table = table();
        for context in MessageContext::ALL {
            let response = table.fallback("anything", context, RiskLevel::High);
            assert_eq!(response.risk_assessment.level, RiskLevel::High);
            assert_eq!(response.risk_assessment.safety_plan, table.safety_plan);
            for resource in &table.crisis_resources {
                assert!(response.resource_recommendations.contains(resource));
            }
            assert!(response.is_fallback());
        }

        let low = table.fallback("anything", MessageContext::General, RiskLevel::Low);
        assert!(low.risk_assessment.safety_plan.is_empty());
    }

    #[test]
    fn test_regional_crisis_lines() {
        let table = ResponseTable::builtin("en-MY").unwrap();
        let response = table.fallback("saya nak mati", MessageContext::Struggling, RiskLevel::High);
        assert!(response
            .resource_recommendations
            .iter()
            .any(|r| r.contains("Befrienders")));
    }

    #[test]
    fn test_incomplete_table_rejected() {
        let mut table = table();
        table.responses.remove(&MessageContext::Sharing);
        let yaml = serde_yaml::to_string(&table).unwrap();
        assert!(ResponseTable::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_classifier_from_table() {
        let classifier = table().classifier().unwrap();
        assert_eq!(classifier.classify("Hello there"), MessageContext::Greeting);
        assert_eq!(
            classifier.classify("I'm so overwhelmed, what should I do?"),
            MessageContext::SeekingHelp
        );
        assert_eq!(classifier.classify("I feel hopeless"), MessageContext::Struggling);
        assert_eq!(classifier.classify("I had a great day"), MessageContext::Positive);
        assert_eq!(classifier.classify("The bus was late"), MessageContext::General);
    }
}
