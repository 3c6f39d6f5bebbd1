//! Mock completion backends for testing
//!
//! Provides configurable implementations of the CompletionBackend trait for
//! testing generation, timeouts and the fail-closed fallback path.

use async_trait::async_trait;
use mindscreen_analysis::{AnalysisConfig, AnalysisPipeline};
use mindscreen_assistant::{
    Assistant, AssistantConfig, CompletionBackend, CompletionRequest, MessageContext,
    ResponseSource, TherapeuticResponder,
};
use mindscreen_core::{AnalysisResult, Error, Result, RiskLevel};
use mindscreen_telemetry::{MetricsCollector, TopicTable};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const VALID_REPLY: &str = r#"```json
{
  "content": "That sounds exhausting. Let's look at one small step together.",
  "therapeuticTechniques": ["validation", "behavioral activation"],
  "copingStrategies": ["short walk"],
  "riskAssessment": {"level": "low", "reasoning": "mock", "confidence": 0.8}
}
```"#;

/// A configurable mock backend
pub struct MockBackend {
    reply: String,
    simulated_latency: Option<Duration>,
    call_count: AtomicU32,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            reply: VALID_REPLY.to_string(),
            simulated_latency: None,
            call_count: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Set the raw text this backend will return
    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    /// Set simulated latency for this backend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_prompt.lock() = Some(request.prompt.clone());

        if let Some(latency) = self.simulated_latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A backend that always fails - for testing error paths
pub struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Err(Error::completion("upstream returned 503"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn responder(backend: Arc<dyn CompletionBackend>, metrics: &MetricsCollector) -> TherapeuticResponder {
    TherapeuticResponder::new(&AssistantConfig::default(), Some(backend))
        .unwrap()
        .with_metrics(metrics.clone())
}

fn analysis(level: RiskLevel) -> AnalysisResult {
    AnalysisResult {
        risk_level: level,
        confidence: 0.7,
        ..Default::default()
    }
}

fn assistant(backend: Option<Arc<dyn CompletionBackend>>) -> Assistant {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    pipeline.warm_up().unwrap();
    let config = AssistantConfig::default();
    Assistant::new(
        Arc::new(pipeline),
        TherapeuticResponder::new(&config, backend).unwrap(),
        MetricsCollector::new(),
        TopicTable::builtin("en").unwrap(),
        config.history_window,
    )
}

#[tokio::test]
async fn generated_response_is_used() {
    let backend = Arc::new(MockBackend::new());
    let metrics = MetricsCollector::new();
    let responder = responder(backend.clone(), &metrics);

    let response = responder
        .respond("I'm so tired lately", &analysis(RiskLevel::Medium), &[])
        .await;

    assert_eq!(response.source, ResponseSource::Generated);
    assert!(response.content.starts_with("That sounds exhausting"));
    assert_eq!(response.risk_assessment.level, RiskLevel::Medium);
    assert_eq!(response.risk_assessment.confidence, 0.8);
    assert_eq!(backend.call_count(), 1);
    assert_eq!(metrics.snapshot().fallback_responses, 0);

    let prompt = backend.last_prompt().unwrap();
    assert!(prompt.contains("Risk level: medium"));
    assert!(prompt.contains("cognitive restructuring"));
}

#[tokio::test]
async fn failing_backend_falls_back() {
    let metrics = MetricsCollector::new();
    let responder = responder(Arc::new(FailingBackend), &metrics);

    let response = responder
        .respond("hello", &analysis(RiskLevel::Low), &[])
        .await;

    assert!(response.is_fallback());
    assert_eq!(response.context, MessageContext::Greeting);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.completion_failures, 1);
    assert_eq!(snapshot.fallback_responses, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_backend_times_out() {
    let backend = Arc::new(MockBackend::new().with_latency(Duration::from_secs(60)));
    let metrics = MetricsCollector::new();
    let responder = responder(backend.clone(), &metrics);

    let response = responder
        .respond("I feel empty", &analysis(RiskLevel::Medium), &[])
        .await;

    assert!(response.is_fallback());
    assert_eq!(backend.call_count(), 1);
    assert_eq!(metrics.snapshot().completion_failures, 1);
}

#[tokio::test]
async fn unparseable_reply_falls_back() {
    let backend = Arc::new(MockBackend::new().with_reply("I'm sorry, I can't produce JSON."));
    let metrics = MetricsCollector::new();
    let responder = responder(backend, &metrics);

    let response = responder
        .respond("what should I do", &analysis(RiskLevel::Medium), &[])
        .await;

    assert!(response.is_fallback());
    assert_eq!(response.context, MessageContext::SeekingHelp);
}

#[tokio::test]
async fn generated_high_risk_reply_gets_crisis_support() {
    let backend = Arc::new(MockBackend::new().with_reply(r#"{"content":"I'm worried about you."}"#));
    let metrics = MetricsCollector::new();
    let responder = responder(backend, &metrics);

    let response = responder
        .respond("I want to end it all", &analysis(RiskLevel::High), &[])
        .await;

    assert_eq!(response.source, ResponseSource::Generated);
    assert!(!response.risk_assessment.safety_plan.is_empty());
    for resource in &responder.table().crisis_resources {
        assert!(response.resource_recommendations.contains(resource));
    }
}

#[tokio::test]
async fn assistant_ignores_blank_messages() {
    let mut assistant = assistant(None);
    assert!(assistant.handle_message("   ").await.is_none());
    assert!(assistant.session().messages.is_empty());
    assert_eq!(assistant.metrics().snapshot().processed_messages, 0);
}

#[tokio::test]
async fn assistant_conversation_flow() {
    let backend = Arc::new(MockBackend::new());
    let mut assistant = assistant(Some(backend.clone() as Arc<dyn CompletionBackend>));

    let first = assistant
        .handle_message("I can't sleep and I'm always tired")
        .await
        .unwrap();
    assert_eq!(first.response.source, ResponseSource::Generated);

    assistant.handle_message("work has been stressful").await.unwrap();

    // rolling history reaches the prompt
    let prompt = backend.last_prompt().unwrap();
    assert!(prompt.contains("user: I can't sleep and I'm always tired"));

    let session = assistant.session();
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.title, "I can't sleep and I'm always");
    assert_eq!(assistant.profile().total_messages, 2);
    assert_eq!(assistant.metrics().snapshot().processed_messages, 2);

    let summary = assistant.summary();
    assert_eq!(summary.message_count, 4);
    assert!(summary.key_topics.contains(&"sleep".to_string()));

    assistant.new_session();
    assert!(assistant.session().messages.is_empty());
    assert_eq!(assistant.profile().session_count, 2);
}

#[tokio::test]
async fn assistant_crisis_message_offline() {
    let mut assistant = assistant(Some(Arc::new(FailingBackend)));

    let reply = assistant.handle_message("I want to end it all").await.unwrap();

    assert_eq!(reply.analysis.risk_level, RiskLevel::High);
    assert_eq!(reply.response.risk_assessment.level, RiskLevel::High);
    assert!(reply.response.is_fallback());
    assert!(!reply.response.risk_assessment.safety_plan.is_empty());

    let snapshot = assistant.metrics().snapshot();
    assert_eq!(snapshot.alerts_generated, 1);
    assert_eq!(snapshot.fallback_responses, 1);
    assert_eq!(snapshot.completion_failures, 1);
}
