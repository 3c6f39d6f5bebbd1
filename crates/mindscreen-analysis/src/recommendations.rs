//! Intervention planning from risk level and cluster characteristics

use mindscreen_core::{Error, Result, RiskLevel, TherapeuticRecommendations};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const EMBEDDED_EN: &str = include_str!("../data/en/interventions.yaml");
const EMBEDDED_EN_MY: &str = include_str!("../data/en-MY/interventions.yaml");

/// Additions applied when a cluster characteristic contains `trigger`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customization {
    pub trigger: String,
    pub interventions: Vec<String>,
    pub cb_techniques: Vec<String>,
    pub behavioral_activation: Vec<String>,
    pub mindfulness_exercises: Vec<String>,
    pub coping_strategies: Vec<String>,
}

/// Base plans per risk level plus cluster-driven customizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionTable {
    pub locale: String,
    pub plans: BTreeMap<RiskLevel, TherapeuticRecommendations>,
    #[serde(default)]
    pub customizations: Vec<Customization>,
}

impl InterventionTable {
    pub fn builtin(locale: &str) -> Result<Self> {
        let source = match locale {
            "en" => EMBEDDED_EN,
            "en-MY" | "en_MY" => EMBEDDED_EN_MY,
            other => {
                return Err(Error::config(format!(
                    "no embedded intervention table for locale '{other}'"
                )))
            }
        };
        Self::from_yaml(source)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut table: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid intervention table: {e}")))?;

        for level in RiskLevel::ALL {
            let plan = table.plans.get_mut(&level).ok_or_else(|| {
                Error::config(format!(
                    "intervention table '{}' has no {level} plan",
                    table.locale
                ))
            })?;
            plan.urgency = level;
        }

        for customization in &mut table.customizations {
            customization.trigger = customization.trigger.to_lowercase();
        }

        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Base plan for `level`, extended by every customization a characteristic triggers
    pub fn plan(&self, level: RiskLevel, characteristics: &[String]) -> TherapeuticRecommendations {
        let mut plan = self.plans.get(&level).cloned().unwrap_or_else(|| {
            TherapeuticRecommendations {
                urgency: level,
                ..Default::default()
            }
        });

        let lowered: Vec<String> = characteristics.iter().map(|c| c.to_lowercase()).collect();
        for customization in &self.customizations {
            if !lowered.iter().any(|c| c.contains(&customization.trigger)) {
                continue;
            }
            plan.interventions.extend(customization.interventions.iter().cloned());
            plan.cb_techniques.extend(customization.cb_techniques.iter().cloned());
            plan.behavioral_activation
                .extend(customization.behavioral_activation.iter().cloned());
            plan.mindfulness_exercises
                .extend(customization.mindfulness_exercises.iter().cloned());
            plan.coping_strategies.extend(customization.coping_strategies.iter().cloned());
        }

        plan
    }
}
