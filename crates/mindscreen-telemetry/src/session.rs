//! Session analytics: user profile, conversation log and session summary
//!
//! A [`Session`] is an in-memory conversation. Persisting it is left to the
//! caller; everything here serializes to camelCase JSON for that purpose.

use crate::topics::TopicTable;
use chrono::{DateTime, Utc};
use mindscreen_core::{AnalysisResult, ChatMessage, ClusterAssignment, RiskLevel, Sentiment};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Sentiments kept in a profile's rolling history
pub const SENTIMENT_HISTORY_LEN: usize = 10;

/// Upper bound on longitudinal histories (clusters, PHQ-9)
pub const HISTORY_LIMIT: usize = 100;

/// Minimum change in mean PHQ-9 that counts as a trend
pub const TRAJECTORY_DEAD_BAND: f64 = 1.0;

/// Title used before the first user message
pub const DEFAULT_TITLE: &str = "New Conversation";

const TITLE_WORDS: usize = 6;
const TITLE_CHARS: usize = 30;
const LAST_MESSAGE_CHARS: usize = 100;

/// Direction of the PHQ-9 trajectory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryTrend {
    Improving,
    #[default]
    Stable,
    Declining,
}

/// Compare the mean of the latest three scores with the three before them
///
/// Lower PHQ-9 is better. With no earlier window the trend is stable.
pub fn trajectory_trend(scores: &[u8]) -> TrajectoryTrend {
    let split = scores.len().saturating_sub(3);
    let (earlier, recent) = scores.split_at(split);
    let previous = &earlier[earlier.len().saturating_sub(3)..];

    if recent.is_empty() || previous.is_empty() {
        return TrajectoryTrend::Stable;
    }

    let mean = |s: &[u8]| s.iter().map(|&v| f64::from(v)).sum::<f64>() / s.len() as f64;
    let delta = mean(recent) - mean(previous);

    if delta < -TRAJECTORY_DEAD_BAND {
        TrajectoryTrend::Improving
    } else if delta > TRAJECTORY_DEAD_BAND {
        TrajectoryTrend::Declining
    } else {
        TrajectoryTrend::Stable
    }
}

/// Longitudinal view of one user across messages and sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub risk_level: RiskLevel,
    pub session_count: u32,
    pub total_messages: u64,
    pub last_interaction: DateTime<Utc>,
    pub sentiment_history: Vec<Sentiment>,
    pub average_confidence: f64,
    pub cluster_history: Vec<ClusterAssignment>,
    #[serde(rename = "phq9EstimatedScore", skip_serializing_if = "Option::is_none")]
    pub phq9_estimated_score: Option<u8>,
    #[serde(rename = "phq9History")]
    pub phq9_history: Vec<u8>,
    pub trajectory_trend: TrajectoryTrend,
    pub risk_factors: Vec<String>,
    pub protective_factors: Vec<String>,
}

impl UserProfile {
    pub fn new() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            session_count: 1,
            total_messages: 0,
            last_interaction: Utc::now(),
            sentiment_history: Vec::new(),
            average_confidence: 0.0,
            cluster_history: Vec::new(),
            phq9_estimated_score: None,
            phq9_history: Vec::new(),
            trajectory_trend: TrajectoryTrend::Stable,
            risk_factors: Vec::new(),
            protective_factors: Vec::new(),
        }
    }

    /// Fold one analysis into the profile
    pub fn record(&mut self, analysis: &AnalysisResult) {
        let previous = self.total_messages as f64;
        self.total_messages += 1;
        self.average_confidence =
            (self.average_confidence * previous + analysis.confidence) / self.total_messages as f64;

        self.risk_level = analysis.risk_level;
        self.last_interaction = Utc::now();

        self.sentiment_history.push(analysis.sentiment);
        trim_front(&mut self.sentiment_history, SENTIMENT_HISTORY_LEN);

        if let Some(assignment) = &analysis.cluster_assignment {
            self.cluster_history.push(assignment.clone());
            trim_front(&mut self.cluster_history, HISTORY_LIMIT);
        }

        let phq9 = analysis.phq9_total();
        self.phq9_estimated_score = Some(phq9);
        self.phq9_history.push(phq9);
        trim_front(&mut self.phq9_history, HISTORY_LIMIT);

        let trend = trajectory_trend(&self.phq9_history);
        if trend != self.trajectory_trend {
            debug!(from = ?self.trajectory_trend, to = ?trend, "PHQ-9 trajectory changed");
        }
        self.trajectory_trend = trend;

        merge_unique(&mut self.risk_factors, &analysis.clinical_indicators.risk_factors);
        merge_unique(
            &mut self.protective_factors,
            &analysis.clinical_indicators.protective_factors,
        );
    }

    /// Begin a new conversation; longitudinal history is kept
    pub fn start_session(&mut self) {
        self.session_count += 1;
        self.total_messages = 0;
        self.sentiment_history.clear();
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_front<T>(items: &mut Vec<T>, limit: usize) {
    if items.len() > limit {
        items.drain(..items.len() - limit);
    }
}

fn merge_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

/// One logged message; assistant replies carry the analysis of the message they answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<usize>,
    #[serde(rename = "phq9Score", skip_serializing_if = "Option::is_none")]
    pub phq9_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
}

impl SessionMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::user(content),
            timestamp: Utc::now(),
            sentiment: None,
            confidence: None,
            risk_level: None,
            cluster_id: None,
            phq9_score: None,
            risk_factors: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, analysis: &AnalysisResult) -> Self {
        Self {
            message: ChatMessage::assistant(content),
            timestamp: Utc::now(),
            sentiment: Some(analysis.sentiment),
            confidence: Some(analysis.confidence),
            risk_level: Some(analysis.risk_level),
            cluster_id: analysis.cluster_assignment.as_ref().map(|a| a.cluster_id),
            phq9_score: Some(analysis.phq9_total()),
            risk_factors: analysis.clinical_indicators.risk_factors.clone(),
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Aggregate view of one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub message_count: usize,
    pub average_risk_level: RiskLevel,
    pub dominant_sentiment: Sentiment,
    pub key_topics: Vec<String>,
    /// Milliseconds between creation and the last update
    pub session_duration: i64,
    pub last_message: String,
    pub cluster_evolution: Vec<usize>,
    #[serde(rename = "phq9Trajectory")]
    pub phq9_trajectory: Vec<u8>,
    pub risk_factor_trends: Vec<String>,
}

/// An in-memory conversation with its user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<SessionMessage>,
    pub user_profile: UserProfile,
}

impl Session {
    pub fn new(user_profile: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TITLE.to_string(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            user_profile,
        }
    }

    /// Log a user message, its analysis and the reply
    pub fn record_exchange(&mut self, text: &str, analysis: &AnalysisResult, reply: &str) {
        self.user_profile.record(analysis);
        self.messages.push(SessionMessage::user(text));
        self.messages.push(SessionMessage::assistant(reply, analysis));
        self.touch();
    }

    /// Start over with an empty conversation and a fresh id
    pub fn restart(&mut self) {
        let previous = self.id;
        let now = Utc::now();
        self.id = Uuid::new_v4();
        self.title = DEFAULT_TITLE.to_string();
        self.created_at = now;
        self.updated_at = now;
        self.messages.clear();
        self.user_profile.start_session();
        debug!(%previous, session = %self.id, sessions = self.user_profile.session_count, "session restarted");
    }

    /// The last `count` messages, oldest first
    pub fn recent_messages(&self, count: usize) -> Vec<ChatMessage> {
        let start = self.messages.len().saturating_sub(count);
        self.messages[start..].iter().map(|m| m.message.clone()).collect()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.title = session_title(&self.messages);
    }

    pub fn summary(&self, topics: &TopicTable) -> SessionSummary {
        let replies: Vec<&SessionMessage> = self
            .messages
            .iter()
            .filter(|m| m.message.role == "assistant")
            .collect();

        let risk_levels: Vec<RiskLevel> = replies.iter().filter_map(|m| m.risk_level).collect();
        let sentiments: Vec<Sentiment> = replies.iter().filter_map(|m| m.sentiment).collect();

        let last_message = self
            .messages
            .last()
            .map(|m| m.content().chars().take(LAST_MESSAGE_CHARS).collect())
            .unwrap_or_default();

        SessionSummary {
            message_count: self.messages.len(),
            average_risk_level: average_risk_level(&risk_levels),
            dominant_sentiment: dominant_sentiment(&sentiments),
            key_topics: topics.key_topics(
                self.messages
                    .iter()
                    .filter(|m| m.message.is_user())
                    .map(SessionMessage::content),
            ),
            session_duration: (self.updated_at - self.created_at).num_milliseconds(),
            last_message,
            cluster_evolution: replies.iter().filter_map(|m| m.cluster_id).collect(),
            phq9_trajectory: replies.iter().filter_map(|m| m.phq9_score).collect(),
            risk_factor_trends: risk_factor_trends(replies.iter().map(|m| m.risk_factors.as_slice())),
        }
    }
}

/// First six words of the first user message, capped at 30 characters
pub fn session_title(messages: &[SessionMessage]) -> String {
    let Some(first) = messages.iter().find(|m| m.message.is_user()) else {
        return DEFAULT_TITLE.to_string();
    };

    let words = first
        .content()
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if words.is_empty() {
        DEFAULT_TITLE.to_string()
    } else if words.chars().count() > TITLE_CHARS {
        format!("{}...", words.chars().take(TITLE_CHARS).collect::<String>())
    } else {
        words
    }
}

/// Mean of low=1, medium=2, high=3 mapped back with 2.5/1.5 cutoffs
pub fn average_risk_level(levels: &[RiskLevel]) -> RiskLevel {
    if levels.is_empty() {
        return RiskLevel::Low;
    }
    let mean = levels.iter().map(RiskLevel::ordinal).sum::<f64>() / levels.len() as f64;
    RiskLevel::from_ordinal(mean, 2.5, 1.5)
}

/// Most frequent sentiment; ties go to the one seen first
pub fn dominant_sentiment(sentiments: &[Sentiment]) -> Sentiment {
    let mut counts: Vec<(Sentiment, usize)> = Vec::new();
    for &sentiment in sentiments {
        match counts.iter_mut().find(|(s, _)| *s == sentiment) {
            Some((_, count)) => *count += 1,
            None => counts.push((sentiment, 1)),
        }
    }

    let mut best: Option<(Sentiment, usize)> = None;
    for (sentiment, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((sentiment, count));
        }
    }
    best.map(|(s, _)| s).unwrap_or(Sentiment::Neutral)
}

/// Distinct risk factors ordered by how often they recur
fn risk_factor_trends<'a>(per_message: impl Iterator<Item = &'a [String]>) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for factors in per_message {
        for factor in factors {
            match counts.iter_mut().find(|(f, _)| f == factor) {
                Some((_, count)) => *count += 1,
                None => counts.push((factor.clone(), 1)),
            }
        }
    }
    // stable sort keeps first-seen order among equals
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(f, _)| f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(level: RiskLevel, sentiment: Sentiment, phq9: u8) -> AnalysisResult {
        let mut result = AnalysisResult {
            risk_level: level,
            sentiment,
            confidence: 0.6,
            ..Default::default()
        };
        result.clinical_indicators.phq9_score = phq9;
        result
    }

    #[test]
    fn test_title_rules() {
        let mut session = Session::new(UserProfile::new());
        assert_eq!(session.title, DEFAULT_TITLE);

        session.record_exchange("hello there", &AnalysisResult::default(), "hi");
        assert_eq!(session.title, "hello there");

        let long = vec![SessionMessage::user(
            "I have been feeling extraordinarily overwhelmed lately at work",
        )];
        let title = session_title(&long);
        assert_eq!(title, "I have been feeling extraordin...");
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn test_average_risk_level() {
        use RiskLevel::*;
        assert_eq!(average_risk_level(&[]), Low);
        assert_eq!(average_risk_level(&[Low, High]), Medium);
        assert_eq!(average_risk_level(&[High, High, Medium, High]), High);
        assert_eq!(average_risk_level(&[Low, Low, Medium]), Low);
    }

    #[test]
    fn test_dominant_sentiment_ties_go_first() {
        use Sentiment::*;
        assert_eq!(dominant_sentiment(&[]), Neutral);
        assert_eq!(dominant_sentiment(&[Negative, Positive, Positive, Negative]), Negative);
        assert_eq!(dominant_sentiment(&[Neutral, Concerning, Concerning]), Concerning);
    }

    #[test]
    fn test_trajectory_trend() {
        assert_eq!(trajectory_trend(&[]), TrajectoryTrend::Stable);
        assert_eq!(trajectory_trend(&[12, 10, 8]), TrajectoryTrend::Stable);
        assert_eq!(trajectory_trend(&[12, 12, 12, 6, 6, 6]), TrajectoryTrend::Improving);
        assert_eq!(trajectory_trend(&[3, 4, 5, 9, 10, 12]), TrajectoryTrend::Declining);
        assert_eq!(trajectory_trend(&[8, 8, 8, 8, 9]), TrajectoryTrend::Stable);
    }

    #[test]
    fn test_profile_record() {
        let mut profile = UserProfile::new();
        let mut first = analysis(RiskLevel::Medium, Sentiment::Negative, 6);
        first.confidence = 0.8;
        first.clinical_indicators.risk_factors = vec!["negative self-evaluation".into()];
        profile.record(&first);

        let mut second = analysis(RiskLevel::Low, Sentiment::Positive, 2);
        second.confidence = 0.4;
        second.clinical_indicators.risk_factors = vec!["negative self-evaluation".into()];
        second.clinical_indicators.protective_factors = vec!["grateful".into()];
        profile.record(&second);

        assert_eq!(profile.total_messages, 2);
        assert!((profile.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(profile.risk_level, RiskLevel::Low);
        assert_eq!(profile.risk_factors.len(), 1);
        assert_eq!(profile.protective_factors, vec!["grateful".to_string()]);
        assert_eq!(profile.sentiment_history, vec![Sentiment::Negative, Sentiment::Positive]);
    }

    #[test]
    fn test_sentiment_history_is_bounded() {
        let mut profile = UserProfile::new();
        for _ in 0..15 {
            profile.record(&analysis(RiskLevel::Low, Sentiment::Neutral, 0));
        }
        profile.record(&analysis(RiskLevel::Low, Sentiment::Positive, 0));
        assert_eq!(profile.sentiment_history.len(), SENTIMENT_HISTORY_LEN);
        assert_eq!(profile.sentiment_history.last(), Some(&Sentiment::Positive));
    }

    #[test]
    fn test_restart_keeps_longitudinal_history() {
        let mut session = Session::new(UserProfile::new());
        let id = session.id;
        session.record_exchange("I feel low", &analysis(RiskLevel::Medium, Sentiment::Negative, 3), "ok");
        session.restart();

        assert_ne!(session.id, id);
        assert!(session.messages.is_empty());
        assert_eq!(session.title, DEFAULT_TITLE);
        assert_eq!(session.user_profile.session_count, 2);
        assert_eq!(session.user_profile.total_messages, 0);
        assert_eq!(session.user_profile.phq9_history.len(), 1);
    }

    #[test]
    fn test_summary() {
        let topics = TopicTable::builtin("en").unwrap();
        let mut session = Session::new(UserProfile::new());

        let mut first = analysis(RiskLevel::High, Sentiment::Concerning, 3);
        first.clinical_indicators.risk_factors = vec!["a".into(), "b".into()];
        session.record_exchange("I can't sleep and I'm so tired", &first, "That sounds hard.");

        let mut second = analysis(RiskLevel::Medium, Sentiment::Negative, 2);
        second.clinical_indicators.risk_factors = vec!["b".into()];
        session.record_exchange("still exhausted", &second, "x".repeat(150).as_str());

        let summary = session.summary(&topics);
        assert_eq!(summary.message_count, 4);
        assert_eq!(summary.average_risk_level, RiskLevel::High);
        assert_eq!(summary.dominant_sentiment, Sentiment::Concerning);
        assert_eq!(summary.key_topics, vec!["sleep".to_string()]);
        assert_eq!(summary.last_message.len(), 100);
        assert_eq!(summary.phq9_trajectory, vec![3, 2]);
        assert_eq!(summary.risk_factor_trends, vec!["b".to_string(), "a".to_string()]);
        assert!(summary.session_duration >= 0);
        assert!(summary.cluster_evolution.is_empty());
    }

    #[test]
    fn test_recent_messages_and_json() {
        let mut session = Session::new(UserProfile::new());
        session.record_exchange("one", &AnalysisResult::default(), "two");
        session.record_exchange("three", &AnalysisResult::default(), "four");

        let recent = session.recent_messages(3);
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three", "four"]);

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert!(json["userProfile"]["sessionCount"].is_number());
    }
}
