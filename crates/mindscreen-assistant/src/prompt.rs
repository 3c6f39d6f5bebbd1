//! Prompt construction for therapeutic response generation

use crate::fallback::Approach;
use mindscreen_core::{AnalysisResult, ChatMessage};
use std::fmt::Write;

const PREAMBLE: &str = "You are a compassionate mental health support assistant trained in \
evidence-based approaches including Cognitive Behavioral Therapy, Behavioral Activation, \
DBT skills, Motivational Interviewing and crisis intervention. You are not a replacement \
for professional care.";

const INSTRUCTIONS: &str = r#"Write a reply that:
1. Validates the user's experience with reflective listening
2. Applies the recommended techniques where they fit
3. Offers concrete coping strategies and resources
4. Addresses safety directly when the risk level is high

Low risk: supportive, skill-building. Medium risk: structured coping and professional resources.
High risk: crisis support, safety planning and immediate referral.

Respond with JSON only, in this shape:
{
  "content": "your reply",
  "therapeuticTechniques": ["..."],
  "supportiveElements": ["..."],
  "recommendedActions": ["..."],
  "copingStrategies": ["..."],
  "riskAssessment": {"reasoning": "...", "confidence": 0.0, "safetyPlan": ["..."]},
  "followUpSuggestions": ["..."],
  "resourceRecommendations": ["..."]
}"#;

/// Build the completion prompt for one user message
pub fn build_prompt(
    message: &str,
    analysis: &AnalysisResult,
    history: &[ChatMessage],
    approach: &Approach,
) -> String {
    let indicators = serde_json::to_string(&analysis.clinical_indicators).unwrap_or_default();
    let history = history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut prompt = String::with_capacity(2048);
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n");
    // writes into a String cannot fail
    let _ = writeln!(prompt, "User message: {message:?}");
    let _ = writeln!(prompt, "Risk level: {}", analysis.risk_level);
    let _ = writeln!(prompt, "Sentiment: {}", analysis.sentiment);
    let _ = writeln!(prompt, "Confidence: {:.2}", analysis.confidence);
    let _ = writeln!(prompt, "Clinical indicators: {indicators}");
    let _ = writeln!(prompt, "Conversation history: {history}");
    let _ = writeln!(
        prompt,
        "Recommended techniques: {}",
        approach.techniques.join(", ")
    );
    let _ = writeln!(
        prompt,
        "Suggested interventions: {}",
        approach.interventions.join(", ")
    );
    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindscreen_core::RiskLevel;

    #[test]
    fn test_prompt_contains_context() {
        let analysis = AnalysisResult {
            risk_level: RiskLevel::Medium,
            confidence: 0.72,
            ..Default::default()
        };
        let history = vec![
            ChatMessage::user("I had a rough week"),
            ChatMessage::assistant("I'm sorry to hear that."),
        ];
        let approach = Approach {
            techniques: vec!["problem solving".into()],
            interventions: vec!["safety planning".into()],
        };

        let prompt = build_prompt("I can't sleep", &analysis, &history, &approach);
        assert!(prompt.contains("User message: \"I can't sleep\""));
        assert!(prompt.contains("Risk level: medium"));
        assert!(prompt.contains("Confidence: 0.72"));
        assert!(prompt.contains("user: I had a rough week | assistant: I'm sorry to hear that."));
        assert!(prompt.contains("Recommended techniques: problem solving"));
        assert!(prompt.contains("phq9Score"));
        assert!(prompt.ends_with('}'));
    }
}
