//! Locale vocabulary tables
//!
//! A [`Vocabulary`] carries every word list the analysis stages match against.
//! Tables are plain YAML; the built-in locales are embedded at compile time and
//! additional locales can be loaded from disk without code changes.

use mindscreen_core::{Error, IndicatorCategory, Result, PHQ9_ITEMS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const EMBEDDED_EN: &str = include_str!("../data/en/vocabulary.yaml");
const EMBEDDED_EN_MY: &str = include_str!("../data/en-MY/vocabulary.yaml");

/// Locales with an embedded vocabulary table
pub const BUILTIN_LOCALES: [&str; 2] = ["en", "en-MY"];

/// Keyword list for one PHQ-9 item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phq9Item {
    pub item: String,
    pub terms: Vec<String>,
}

/// Frequency qualifier and the item points it implies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    pub points: u8,
    pub terms: Vec<String>,
}

/// Word lists for one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub locale: String,

    #[serde(default)]
    pub first_person: Vec<String>,

    #[serde(default)]
    pub negations: Vec<String>,

    #[serde(default)]
    pub absolutist: Vec<String>,

    #[serde(default)]
    pub intensifiers: Vec<String>,

    /// Clinical indicator terms by category
    pub indicators: BTreeMap<IndicatorCategory, Vec<String>>,

    /// Human-readable risk factor per matched category
    #[serde(default)]
    pub risk_factors: BTreeMap<IndicatorCategory, String>,

    #[serde(default)]
    pub positive: Vec<String>,

    pub phq9: Vec<Phq9Item>,

    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,

    #[serde(default)]
    pub high_risk_phrases: Vec<String>,

    #[serde(default)]
    pub medium_risk_phrases: Vec<String>,
}

impl Vocabulary {
    /// Load the embedded table for a built-in locale
    pub fn builtin(locale: &str) -> Result<Self> {
        let source = match locale {
            "en" => EMBEDDED_EN,
            "en-MY" | "en_MY" => EMBEDDED_EN_MY,
            other => {
                return Err(Error::config(format!(
                    "no embedded vocabulary for locale '{other}'"
                )))
            }
        };
        Self::from_yaml(source)
    }

    /// Default English table
    pub fn english() -> Result<Self> {
        Self::builtin("en")
    }

    /// Parse and validate a table from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let vocabulary: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid vocabulary table: {e}")))?;
        vocabulary.validate()?;
        Ok(vocabulary.normalized())
    }

    /// Load a table from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.phq9.len() != PHQ9_ITEMS {
            return Err(Error::config(format!(
                "vocabulary '{}' defines {} PHQ-9 items, expected {}",
                self.locale,
                self.phq9.len(),
                PHQ9_ITEMS
            )));
        }

        if self.indicators.values().all(|terms| terms.is_empty()) {
            return Err(Error::config(format!(
                "vocabulary '{}' has no indicator terms",
                self.locale
            )));
        }

        if let Some((phrase, term)) = self.repeated_indicator() {
            return Err(Error::config(format!(
                "medium-risk phrase '{phrase}' repeats indicator term '{term}'"
            )));
        }

        if let Some(q) = self.qualifiers.iter().find(|q| !(1..=3).contains(&q.points)) {
            return Err(Error::config(format!(
                "qualifier points must be 1-3, got {}",
                q.points
            )));
        }

        Ok(())
    }

    /// A medium-risk phrase that contains an indicator term, which the scorer
    /// would otherwise count twice
    fn repeated_indicator(&self) -> Option<(String, String)> {
        let terms: Vec<String> = self
            .indicators
            .values()
            .flatten()
            .map(|t| normalize_text(t.trim()))
            .filter(|t| !t.is_empty())
            .collect();

        self.medium_risk_phrases.iter().find_map(|phrase| {
            let phrase = normalize_text(phrase.trim());
            terms
                .iter()
                .find(|term| phrase.contains(term.as_str()))
                .map(|term| (phrase.clone(), term.clone()))
        })
    }

    /// Lowercase every term and drop blanks so matchers see one canonical form
    fn normalized(mut self) -> Self {
        fn fold(terms: &mut Vec<String>) {
            for term in terms.iter_mut() {
                *term = normalize_text(term.trim());
            }
            terms.retain(|t| !t.is_empty());
        }

        fold(&mut self.first_person);
        fold(&mut self.negations);
        fold(&mut self.absolutist);
        fold(&mut self.intensifiers);
        fold(&mut self.positive);
        fold(&mut self.high_risk_phrases);
        fold(&mut self.medium_risk_phrases);
        self.indicators.values_mut().for_each(fold);
        self.phq9.iter_mut().for_each(|item| fold(&mut item.terms));
        self.qualifiers.iter_mut().for_each(|q| fold(&mut q.terms));
        self
    }

    /// Indicator terms for one category
    pub fn indicator_terms(&self, category: IndicatorCategory) -> &[String] {
        self.indicators
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Risk factor descriptor for a category, falling back to the category name
    pub fn risk_factor(&self, category: IndicatorCategory) -> String {
        self.risk_factors
            .get(&category)
            .cloned()
            .unwrap_or_else(|| format!("{category} indicators"))
    }
}

/// Case-fold text and unify typographic apostrophes
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_locales_load() {
        for locale in BUILTIN_LOCALES {
            let vocabulary = Vocabulary::builtin(locale).unwrap();
            assert_eq!(vocabulary.locale, locale);
            assert_eq!(vocabulary.phq9.len(), PHQ9_ITEMS);
            assert!(!vocabulary.indicator_terms(IndicatorCategory::Suicidal).is_empty());
        }
    }

    #[test]
    fn test_unknown_locale_is_config_error() {
        let err = Vocabulary::builtin("fr").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_regional_table_extends_english() {
        let en = Vocabulary::builtin("en").unwrap();
        let my = Vocabulary::builtin("en-MY").unwrap();
        assert!(my.positive.len() > en.positive.len());
        assert!(my
            .indicator_terms(IndicatorCategory::Suicidal)
            .iter()
            .any(|t| t == "bunuh diri"));
    }

    #[test]
    fn test_wrong_phq9_item_count_rejected() {
        let yaml = r#"
locale: test
indicators:
  emotional: [sad]
phq9:
  - item: mood
    terms: [sad]
"#;
        let err = Vocabulary::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("PHQ-9 items"));
    }

    #[test]
    fn test_medium_phrase_repeating_indicator_rejected() {
        let mut yaml = String::from(
            "locale: test\nindicators:\n  behavioral: [tired]\nmedium_risk_phrases: [\"Feel Tired\"]\nphq9:\n",
        );
        for i in 0..PHQ9_ITEMS {
            yaml.push_str(&format!("  - item: i{i}\n    terms: [t{i}]\n"));
        }
        let err = Vocabulary::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("repeats indicator term 'tired'"));
    }

    #[test]
    fn test_builtin_phrases_do_not_repeat_indicators() {
        for locale in BUILTIN_LOCALES {
            let vocabulary = Vocabulary::builtin(locale).unwrap();
            assert_eq!(vocabulary.repeated_indicator(), None, "{locale}");
        }
    }

    #[test]
    fn test_depressed_mood_terms_skip_everyday_words() {
        let vocabulary = Vocabulary::english().unwrap();
        let mood = vocabulary
            .phq9
            .iter()
            .find(|item| item.item == "depressed_mood")
            .unwrap();
        for text in ["download the file", "please sit down"] {
            assert!(!mood.terms.iter().any(|t| text.contains(t.as_str())), "{text}");
        }
        assert!(mood.terms.iter().any(|t| "i keep feeling down".contains(t.as_str())));
    }

    #[test]
    fn test_terms_are_normalized() {
        let mut yaml = String::from("locale: test\nindicators:\n  emotional: [\"  SAD \", \"Can\u{2019}t Sleep\"]\nphq9:\n");
        for i in 0..PHQ9_ITEMS {
            yaml.push_str(&format!("  - item: i{i}\n    terms: [t{i}]\n"));
        }
        let vocabulary = Vocabulary::from_yaml(&yaml).unwrap();
        assert_eq!(
            vocabulary.indicator_terms(IndicatorCategory::Emotional),
            &["sad".to_string(), "can't sleep".to_string()]
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.yaml");
        std::fs::write(&path, EMBEDDED_EN).unwrap();
        let vocabulary = Vocabulary::from_file(&path).unwrap();
        assert_eq!(vocabulary.locale, "en");
    }
}
