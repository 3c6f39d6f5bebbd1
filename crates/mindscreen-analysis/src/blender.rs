//! Rule/cluster risk reconciliation

use crate::config::BlendingConfig;
use mindscreen_core::{AnalysisResult, ClusterAssignment, RiskLevel, Sentiment};
use tracing::warn;

pub struct RiskBlender {
    config: BlendingConfig,
}

impl RiskBlender {
    pub fn new(config: BlendingConfig) -> Self {
        Self { config }
    }

    /// Combine a rule-based result with an optional cluster verdict
    ///
    /// A confident assignment (above the threshold) imposes the cluster's risk
    /// level; a weaker one is blended numerically with the base level. A matched
    /// risk keyword always ends at `high`.
    pub fn blend(
        &self,
        mut base: AnalysisResult,
        assignment: Option<ClusterAssignment>,
        cluster_risk: Option<RiskLevel>,
    ) -> AnalysisResult {
        if let (Some(assignment), Some(cluster_risk)) = (assignment.as_ref(), cluster_risk) {
            let risk_level = if assignment.confidence > self.config.confidence_threshold {
                cluster_risk
            } else {
                let blended = self.config.cluster_weight * cluster_risk.ordinal()
                    + self.config.base_weight * base.risk_level.ordinal();
                RiskLevel::from_ordinal(blended, self.config.high_cutoff, self.config.medium_cutoff)
            };

            base.sentiment = match risk_level {
                RiskLevel::High => Sentiment::Concerning,
                RiskLevel::Medium if base.sentiment == Sentiment::Positive => Sentiment::Neutral,
                RiskLevel::Medium => Sentiment::Negative,
                RiskLevel::Low => base.sentiment,
            };
            base.risk_level = risk_level;
            base.confidence = base.confidence.max(assignment.confidence);
        }

        if base.has_risk_keywords() && base.risk_level != RiskLevel::High {
            warn!(
                keywords = ?base.keyword_analysis.risk_keywords,
                "risk keywords matched, escalating to high"
            );
            base.risk_level = RiskLevel::High;
            base.sentiment = Sentiment::Concerning;
        }

        base.cluster_assignment = assignment;
        base.confidence = base.confidence.clamp(0.0, 1.0);
        base
    }
}

impl Default for RiskBlender {
    fn default() -> Self {
        Self::new(BlendingConfig::default())
    }
}
