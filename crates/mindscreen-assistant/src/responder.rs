//! Therapeutic responder
//!
//! Generates a reply through the completion backend and fails closed: a
//! timeout, a transport error or an unparseable reply all degrade to the
//! locale fallback table. Callers never see a completion error.

use crate::completion::{CompletionBackend, CompletionRequest};
use crate::config::AssistantConfig;
use crate::context::{ContextClassifier, MessageContext};
use crate::fallback::ResponseTable;
use crate::prompt::build_prompt;
use crate::response::{
    strip_code_fences, GeneratedResponse, ResponseSource, RiskAssessment, TherapeuticResponse,
};
use mindscreen_core::{AnalysisResult, ChatMessage, Error, Result};
use mindscreen_telemetry::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_CONTENT: &str = "I'm here to listen and support you. How are you feeling right now?";
const DEFAULT_REASONING: &str = "Standard supportive response";
const DEFAULT_CONFIDENCE: f64 = 0.7;

pub struct TherapeuticResponder {
    backend: Option<Arc<dyn CompletionBackend>>,
    table: ResponseTable,
    classifier: ContextClassifier,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
    metrics: MetricsCollector,
}

impl TherapeuticResponder {
    /// Responder for the configured locale; `None` backend means fallback only
    pub fn new(config: &AssistantConfig, backend: Option<Arc<dyn CompletionBackend>>) -> Result<Self> {
        let table = ResponseTable::builtin(&config.locale)?;
        Self::with_table(config, backend, table)
    }

    pub fn with_table(
        config: &AssistantConfig,
        backend: Option<Arc<dyn CompletionBackend>>,
        table: ResponseTable,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = table.classifier()?;
        Ok(Self {
            backend,
            table,
            classifier,
            timeout: config.timeout(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            metrics: MetricsCollector::new(),
        })
    }

    /// Share a metrics collector for fallback and failure counts
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn table(&self) -> &ResponseTable {
        &self.table
    }

    pub fn classify(&self, message: &str) -> MessageContext {
        self.classifier.classify(message)
    }

    /// Reply to `message`; always succeeds
    pub async fn respond(
        &self,
        message: &str,
        analysis: &AnalysisResult,
        history: &[ChatMessage],
    ) -> TherapeuticResponse {
        let context = self.classify(message);

        let Some(backend) = &self.backend else {
            debug!(%context, risk = %analysis.risk_level, "no completion backend, using fallback");
            return self.fallback(message, context, analysis);
        };

        match self.generate(backend.as_ref(), message, analysis, history, context).await {
            Ok(response) => response,
            Err(e) => {
                self.metrics.record_completion_failure();
                warn!(backend = backend.name(), error = %e, "response generation failed, using fallback");
                self.fallback(message, context, analysis)
            }
        }
    }

    fn fallback(
        &self,
        message: &str,
        context: MessageContext,
        analysis: &AnalysisResult,
    ) -> TherapeuticResponse {
        self.metrics.record_fallback();
        self.table.fallback(message, context, analysis.risk_level)
    }

    async fn generate(
        &self,
        backend: &dyn CompletionBackend,
        message: &str,
        analysis: &AnalysisResult,
        history: &[ChatMessage],
        context: MessageContext,
    ) -> Result<TherapeuticResponse> {
        let approach = self.table.approach(analysis.risk_level);
        let prompt = build_prompt(message, analysis, history, &approach);
        let request = CompletionRequest::new(prompt, self.temperature, self.max_tokens);

        let raw = tokio::time::timeout(self.timeout, backend.complete(&request))
            .await
            .map_err(|_| Error::Timeout)??;

        let mut response = parse_generated(&raw, analysis, context)?;
        self.table.ensure_crisis_support(&mut response);
        Ok(response)
    }
}

/// Parse model output into a response; the risk level is pinned to the analysis
pub fn parse_generated(
    raw: &str,
    analysis: &AnalysisResult,
    context: MessageContext,
) -> Result<TherapeuticResponse> {
    let parsed: GeneratedResponse = serde_json::from_str(strip_code_fences(raw))?;
    let assessment = parsed.risk_assessment.unwrap_or_default();

    let content = parsed
        .content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT.to_string());

    Ok(TherapeuticResponse {
        content,
        therapeutic_techniques: parsed.therapeutic_techniques,
        supportive_elements: parsed.supportive_elements,
        recommended_actions: parsed.recommended_actions,
        coping_strategies: parsed.coping_strategies,
        risk_assessment: RiskAssessment {
            level: analysis.risk_level,
            reasoning: assessment
                .reasoning
                .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
            confidence: assessment
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(DEFAULT_CONFIDENCE)
                .clamp(0.0, 1.0),
            safety_plan: assessment.safety_plan,
        },
        follow_up_suggestions: parsed.follow_up_suggestions,
        resource_recommendations: parsed.resource_recommendations,
        context,
        source: ResponseSource::Generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindscreen_core::RiskLevel;

    fn analysis(level: RiskLevel) -> AnalysisResult {
        AnalysisResult {
            risk_level: level,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_pins_level_and_clamps_confidence() {
        let raw = "```json\n{\"content\":\"I hear you.\",\"riskAssessment\":{\"level\":\"low\",\"confidence\":1.7}}\n```";
        let response =
            parse_generated(raw, &analysis(RiskLevel::High), MessageContext::Struggling).unwrap();
        assert_eq!(response.content, "I hear you.");
        assert_eq!(response.risk_assessment.level, RiskLevel::High);
        assert_eq!(response.risk_assessment.confidence, 1.0);
        assert_eq!(response.source, ResponseSource::Generated);
    }

    #[test]
    fn test_parse_defaults() {
        let response = parse_generated("{}", &analysis(RiskLevel::Low), MessageContext::General).unwrap();
        assert_eq!(response.content, DEFAULT_CONTENT);
        assert_eq!(response.risk_assessment.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(response.risk_assessment.reasoning, DEFAULT_REASONING);
    }

    #[test]
    fn test_parse_rejects_prose() {
        let result = parse_generated(
            "Sure! Here is a reply.",
            &analysis(RiskLevel::Low),
            MessageContext::General,
        );
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_offline_responder_uses_fallback() {
        let metrics = MetricsCollector::new();
        let responder = TherapeuticResponder::new(&AssistantConfig::default(), None)
            .unwrap()
            .with_metrics(metrics.clone());

        let response = responder
            .respond("hello", &analysis(RiskLevel::Low), &[])
            .await;
        assert!(response.is_fallback());
        assert_eq!(response.context, MessageContext::Greeting);
        assert_eq!(metrics.snapshot().fallback_responses, 1);
        assert_eq!(metrics.snapshot().completion_failures, 0);
    }
}
