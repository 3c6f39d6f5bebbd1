//! Therapeutic response types

use crate::context::MessageContext;
use mindscreen_core::RiskLevel;
use serde::{Deserialize, Serialize};

/// Where a response came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Generated,
    #[default]
    Fallback,
}

/// Risk view attached to a response; `level` always mirrors the analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reasoning: String,
    pub confidence: f64,
    pub safety_plan: Vec<String>,
}

/// A reply to the user plus its therapeutic metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapeuticResponse {
    pub content: String,
    pub therapeutic_techniques: Vec<String>,
    pub supportive_elements: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub risk_assessment: RiskAssessment,
    pub follow_up_suggestions: Vec<String>,
    pub resource_recommendations: Vec<String>,
    pub context: MessageContext,
    pub source: ResponseSource,
}

impl TherapeuticResponse {
    pub fn is_fallback(&self) -> bool {
        self.source == ResponseSource::Fallback
    }
}

/// Shape the completion model is asked to produce; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GeneratedResponse {
    pub content: Option<String>,
    pub therapeutic_techniques: Vec<String>,
    pub supportive_elements: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub risk_assessment: Option<GeneratedAssessment>,
    pub follow_up_suggestions: Vec<String>,
    pub resource_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GeneratedAssessment {
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
    pub safety_plan: Vec<String>,
}

/// Remove Markdown code fences a model may wrap its JSON in
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_generated_response_tolerates_missing_fields() {
        let parsed: GeneratedResponse =
            serde_json::from_str(r#"{"content":"hello","unknown":true}"#).unwrap();
        assert_eq!(parsed.content.as_deref(), Some("hello"));
        assert!(parsed.risk_assessment.is_none());
        assert!(parsed.coping_strategies.is_empty());
    }

    #[test]
    fn test_response_json_names() {
        let response = TherapeuticResponse::default();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source"], "fallback");
        assert!(json["riskAssessment"]["safetyPlan"].is_array());
        assert!(json.get("followUpSuggestions").is_some());
    }
}
