//! Layered settings: serde defaults, then an optional YAML file, then
//! `MINDSCREEN__*` environment variables

use anyhow::{Context, Result};
use mindscreen_analysis::AnalysisConfig;
use mindscreen_assistant::AssistantConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "MINDSCREEN";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Settings {
    pub fn load(file: Option<&Path>, locale: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let mut settings: Settings = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        if let Some(locale) = locale {
            settings.analysis.locale.default = locale.to_string();
            settings.assistant.locale = locale.to_string();
        }

        settings.analysis.validate()?;
        settings.assistant.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load(None, None).unwrap();
        assert_eq!(settings.analysis.clustering.k, 4);
        assert_eq!(settings.assistant.timeout_secs, 15);
    }

    #[test]
    fn test_file_and_locale_override() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "analysis:\n  clustering:\n    k: 3\nassistant:\n  model: local-model\n"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path()), Some("en-MY")).unwrap();
        assert_eq!(settings.analysis.clustering.k, 3);
        assert_eq!(settings.analysis.clustering.iterations, 10);
        assert_eq!(settings.assistant.model, "local-model");
        assert_eq!(settings.assistant.locale, "en-MY");
        assert_eq!(settings.analysis.locale.default, "en-MY");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/mindscreen.yaml")), None).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "analysis:\n  clustering:\n    k: 0\n").unwrap();
        assert!(Settings::load(Some(file.path()), None).is_err());
    }
}
