//! Key-topic extraction for session summaries

use aho_corasick::AhoCorasick;
use mindscreen_core::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

const EMBEDDED_EN: &str = include_str!("../data/en/topics.yaml");
const EMBEDDED_EN_MY: &str = include_str!("../data/en-MY/topics.yaml");

#[derive(Debug, Clone, Deserialize)]
struct TopicDef {
    name: String,
    #[serde(default = "default_min_matches")]
    min_matches: usize,
    cues: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TopicFile {
    locale: String,
    #[serde(default = "default_max_topics")]
    max_topics: usize,
    topics: Vec<TopicDef>,
    #[serde(default)]
    specific_terms: Vec<String>,
}

// Default value functions
fn default_min_matches() -> usize {
    2
}

fn default_max_topics() -> usize {
    6
}

/// Locale topic cues compiled into one automaton
#[derive(Debug, Clone)]
pub struct TopicTable {
    locale: String,
    max_topics: usize,
    topics: Vec<TopicDef>,
    specific_terms: Vec<String>,
    /// Cue patterns followed by specific terms
    automaton: AhoCorasick,
    /// Owning topic per cue pattern; `None` marks a specific term
    owners: Vec<Option<usize>>,
}

impl TopicTable {
    pub fn builtin(locale: &str) -> Result<Self> {
        let source = match locale {
            "en" => EMBEDDED_EN,
            "en-MY" | "en_MY" => EMBEDDED_EN_MY,
            other => {
                return Err(Error::config(format!(
                    "no embedded topic table for locale '{other}'"
                )))
            }
        };
        Self::from_yaml(source)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: TopicFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid topic table: {e}")))?;

        if let Some(topic) = file.topics.iter().find(|t| t.min_matches == 0) {
            return Err(Error::config(format!(
                "topic '{}' must require at least one cue",
                topic.name
            )));
        }

        let mut patterns = Vec::new();
        let mut owners = Vec::new();
        for (index, topic) in file.topics.iter().enumerate() {
            for cue in &topic.cues {
                patterns.push(cue.to_lowercase());
                owners.push(Some(index));
            }
        }
        for term in &file.specific_terms {
            patterns.push(term.to_lowercase());
            owners.push(None);
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .map_err(|e| Error::config(format!("failed to build topic matcher: {e}")))?;

        Ok(Self {
            locale: file.locale,
            max_topics: file.max_topics,
            topics: file.topics,
            specific_terms: file.specific_terms,
            automaton,
            owners,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Topics discussed across `texts`, in table order, capped at `max_topics`
    ///
    /// Each cue counts once however often it occurs.
    pub fn key_topics<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let joined = texts
            .into_iter()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");

        let found: BTreeSet<usize> = self
            .automaton
            .find_overlapping_iter(&joined)
            .map(|m| m.pattern().as_usize())
            .collect();

        let mut cue_counts = vec![0usize; self.topics.len()];
        let mut specific = Vec::new();
        for pattern in found {
            match self.owners[pattern] {
                Some(topic) => cue_counts[topic] += 1,
                None => specific.push(pattern),
            }
        }

        let specific_offset = self.owners.len() - self.specific_terms.len();
        let mut topics: Vec<String> = self
            .topics
            .iter()
            .zip(&cue_counts)
            .filter(|(topic, &count)| count >= topic.min_matches)
            .map(|(topic, _)| topic.name.clone())
            .collect();

        for pattern in specific {
            let term = &self.specific_terms[pattern - specific_offset];
            if !topics.contains(term) {
                topics.push(term.clone());
            }
        }

        topics.truncate(self.max_topics);
        topics
    }
}
