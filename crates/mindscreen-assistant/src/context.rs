//! Message context classification

use mindscreen_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What the user is doing in a message, used to pick a fallback reply
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MessageContext {
    Greeting,
    Sharing,
    SeekingHelp,
    Positive,
    Struggling,
    #[default]
    General,
}

impl MessageContext {
    pub const ALL: [MessageContext; 6] = [
        Self::Greeting,
        Self::Sharing,
        Self::SeekingHelp,
        Self::Positive,
        Self::Struggling,
        Self::General,
    ];

    /// Contexts with cue lists, in the order they are tested
    pub const PRECEDENCE: [MessageContext; 5] = [
        Self::SeekingHelp,
        Self::Struggling,
        Self::Positive,
        Self::Greeting,
        Self::Sharing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Sharing => "sharing",
            Self::SeekingHelp => "seeking_help",
            Self::Positive => "positive",
            Self::Struggling => "struggling",
            Self::General => "general",
        }
    }
}

impl fmt::Display for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-word cue matcher per context
#[derive(Debug, Clone)]
pub struct ContextClassifier {
    rules: Vec<(MessageContext, Regex)>,
}

impl ContextClassifier {
    pub fn new(cues: &BTreeMap<MessageContext, Vec<String>>) -> Result<Self> {
        let mut rules = Vec::new();

        for context in MessageContext::PRECEDENCE {
            let Some(terms) = cues.get(&context) else {
                continue;
            };
            let alternatives: Vec<String> = terms
                .iter()
                .map(|t| normalize(t.trim()))
                .filter(|t| !t.is_empty())
                .map(|t| regex::escape(&t))
                .collect();
            if alternatives.is_empty() {
                continue;
            }

            let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
            let regex = Regex::new(&pattern).map_err(|e| {
                Error::config(format!("invalid cue list for context '{context}': {e}"))
            })?;
            rules.push((context, regex));
        }

        Ok(Self { rules })
    }

    /// First context in precedence order with a matching cue, else `General`
    pub fn classify(&self, text: &str) -> MessageContext {
        let text = normalize(text);
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(&text))
            .map(|(context, _)| *context)
            .unwrap_or(MessageContext::General)
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ContextClassifier {
        let mut cues = BTreeMap::new();
        cues.insert(MessageContext::Greeting, vec!["hi".to_string(), "hello".to_string()]);
        cues.insert(MessageContext::SeekingHelp, vec!["what should i do".to_string()]);
        cues.insert(MessageContext::Struggling, vec!["can't cope".to_string()]);
        cues.insert(MessageContext::Positive, vec!["great".to_string()]);
        cues.insert(MessageContext::Sharing, vec!["today".to_string()]);
        ContextClassifier::new(&cues).unwrap()
    }

    #[test]
    fn test_precedence() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("Hi, I can't cope, what should I do?"),
            MessageContext::SeekingHelp
        );
        assert_eq!(classifier.classify("hello, I can\u{2019}t cope"), MessageContext::Struggling);
        assert_eq!(classifier.classify("Hello! Great news"), MessageContext::Positive);
        assert_eq!(classifier.classify("hello"), MessageContext::Greeting);
        assert_eq!(classifier.classify("work today was long"), MessageContext::Sharing);
    }

    #[test]
    fn test_whole_words_only() {
        let classifier = classifier();
        assert_eq!(classifier.classify("this thing"), MessageContext::General);
        assert_eq!(classifier.classify(""), MessageContext::General);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&MessageContext::SeekingHelp).unwrap(),
            "\"seeking_help\""
        );
    }
}
