//! Conversation orchestration
//!
//! One [`Assistant`] drives one conversation: analyze the message, record
//! metrics, update the session profile and reply.

use crate::responder::TherapeuticResponder;
use crate::response::TherapeuticResponse;
use mindscreen_analysis::AnalysisPipeline;
use mindscreen_core::{AnalysisResult, RiskLevel};
use mindscreen_telemetry::{MetricsCollector, Session, SessionSummary, TopicTable, UserProfile};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Analysis and reply for one user message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub analysis: AnalysisResult,
    pub response: TherapeuticResponse,
}

pub struct Assistant {
    pipeline: Arc<AnalysisPipeline>,
    responder: TherapeuticResponder,
    metrics: MetricsCollector,
    topics: TopicTable,
    session: Session,
    history_window: usize,
}

impl Assistant {
    /// The responder is attached to `metrics` so fallback counts land in the same collector
    pub fn new(
        pipeline: Arc<AnalysisPipeline>,
        responder: TherapeuticResponder,
        metrics: MetricsCollector,
        topics: TopicTable,
        history_window: usize,
    ) -> Self {
        Self {
            pipeline,
            responder: responder.with_metrics(metrics.clone()),
            metrics,
            topics,
            session: Session::new(UserProfile::new()),
            history_window,
        }
    }

    /// Handle one user message; blank input is ignored
    pub async fn handle_message(&mut self, text: &str) -> Option<AssistantReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let analysis = self.pipeline.analyze(text);
        self.metrics.record_analysis(&analysis);

        let history = self.session.recent_messages(self.history_window);
        let response = self.responder.respond(text, &analysis, &history).await;

        self.session.record_exchange(text, &analysis, &response.content);

        if analysis.risk_level == RiskLevel::High {
            info!(session = %self.session.id, "high-risk message, crisis resources attached");
        }

        Some(AssistantReply { analysis, response })
    }

    /// Clear the conversation and count a new session on the profile
    pub fn new_session(&mut self) {
        self.session.restart();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> &UserProfile {
        &self.session.user_profile
    }

    pub fn summary(&self) -> SessionSummary {
        self.session.summary(&self.topics)
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn pipeline(&self) -> &Arc<AnalysisPipeline> {
        &self.pipeline
    }
}
