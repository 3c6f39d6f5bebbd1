//! PHQ-9 style estimation
//!
//! Two estimators live here. The keyword estimator scores each of the nine
//! symptom groups from matched terms and nearby frequency qualifiers. The
//! cluster estimator derives a total from an assigned cluster's mean score.

use crate::keywords::{build_automaton, matched_patterns};
use crate::vocabulary::{normalize_text, Vocabulary};
use aho_corasick::AhoCorasick;
use mindscreen_core::{ClusterAssignment, ClusterData, Phq9Estimation, Result, PHQ9_ITEMS, PHQ9_MAX};

/// Confidence reported when no symptom group matched
pub const NO_EVIDENCE_CONFIDENCE: f64 = 0.3;

const DEFAULT_ITEM_POINTS: u8 = 1;

/// Keyword-driven PHQ-9 estimator
pub struct Phq9Estimator {
    items: Vec<AhoCorasick>,
    qualifiers: AhoCorasick,
    qualifier_points: Vec<u8>,
    window: usize,
}

impl Phq9Estimator {
    pub fn new(vocabulary: &Vocabulary, window: usize) -> Result<Self> {
        let items = vocabulary
            .phq9
            .iter()
            .map(|item| build_automaton(&item.terms, &format!("PHQ-9 {}", item.item)))
            .collect::<Result<Vec<_>>>()?;

        let (qualifier_terms, qualifier_points): (Vec<String>, Vec<u8>) = vocabulary
            .qualifiers
            .iter()
            .flat_map(|q| q.terms.iter().map(move |t| (t.clone(), q.points)))
            .unzip();

        Ok(Self {
            items,
            qualifiers: build_automaton(&qualifier_terms, "qualifier")?,
            qualifier_points,
            window,
        })
    }

    pub fn estimate(&self, text: &str) -> Phq9Estimation {
        let normalized = normalize_text(text);

        let item_scores: Vec<u8> = self
            .items
            .iter()
            .map(|automaton| {
                automaton
                    .find_overlapping_iter(&normalized)
                    .map(|m| self.points_near(&normalized, m.start(), m.end()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let matched = item_scores.iter().filter(|&&s| s > 0).count();
        let confidence = if matched == 0 {
            NO_EVIDENCE_CONFIDENCE
        } else {
            (0.4 + 0.1 * matched as f64).min(0.9)
        };

        Phq9Estimation::from_items(item_scores, confidence)
    }

    /// Highest qualifier within the window around a match, or the default point
    fn points_near(&self, text: &str, start: usize, end: usize) -> u8 {
        let from = floor_char_boundary(text, start.saturating_sub(self.window));
        let to = ceil_char_boundary(text, end.saturating_add(self.window));
        let window = &text[from..to];

        matched_patterns(&self.qualifiers, window)
            .into_iter()
            .map(|index| self.qualifier_points[index])
            .max()
            .unwrap_or(DEFAULT_ITEM_POINTS)
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Derive an estimate from the assigned cluster's mean PHQ-9
///
/// The mean is scaled down with distance from the centroid, then spread evenly
/// over the nine items with the remainder going to the first items.
pub fn estimate_from_cluster(
    cluster: Option<&ClusterData>,
    assignment: &ClusterAssignment,
) -> Phq9Estimation {
    let Some(cluster) = cluster else {
        return Phq9Estimation::empty(NO_EVIDENCE_CONFIDENCE);
    };

    let adjustment = (1.0 - assignment.distance_to_center / 2.0).max(0.0);
    let total = (cluster.avg_phq9_score * adjustment)
        .round()
        .clamp(0.0, f64::from(PHQ9_MAX)) as usize;

    let base = total / PHQ9_ITEMS;
    let remainder = total % PHQ9_ITEMS;
    let items = (0..PHQ9_ITEMS)
        .map(|i| {
            let score = base + usize::from(i < remainder);
            score.min(3) as u8
        })
        .collect();

    Phq9Estimation::from_items(items, assignment.confidence)
}

/// Estimate reported on the final result
///
/// The cluster estimate decays to nothing far from every centroid, so it is
/// only reported when it exceeds what the message text itself supports.
pub fn reported_estimate(keyword: Phq9Estimation, cluster: Phq9Estimation) -> Phq9Estimation {
    if cluster.total_score > keyword.total_score {
        cluster
    } else {
        keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mindscreen_core::{RiskLevel, SeverityCategory};

    fn estimator() -> Phq9Estimator {
        Phq9Estimator::new(&Vocabulary::english().unwrap(), 40).unwrap()
    }

    fn assignment(distance: f64, confidence: f64) -> ClusterAssignment {
        ClusterAssignment {
            cluster_id: 0,
            confidence,
            timestamp: Utc::now(),
            features: vec![0.0; 6],
            distance_to_center: distance,
        }
    }

    fn cluster(avg: f64) -> ClusterData {
        ClusterData {
            id: 0,
            centroid: vec![0.0; 6],
            size: 2,
            risk_level: RiskLevel::from_phq9(avg),
            characteristics: vec![],
            avg_phq9_score: avg,
            avg_confidence: 0.5,
        }
    }

    #[test]
    fn test_no_symptoms() {
        let estimate = estimator().estimate("I had a lovely lunch");
        assert_eq!(estimate.total_score, 0);
        assert_eq!(estimate.confidence_level, NO_EVIDENCE_CONFIDENCE);
        assert_eq!(estimate.severity_category, SeverityCategory::Minimal);
    }

    #[test]
    fn test_default_and_qualified_points() {
        let estimate = estimator().estimate("sometimes I can't sleep and feel tired");
        assert_eq!(estimate.item_scores[2], 1);
        assert_eq!(estimate.item_scores[3], 1);
        assert_eq!(estimate.total_score, 2);
        assert!((estimate.confidence_level - 0.6).abs() < 1e-12);

        let estimate = estimator().estimate("I feel exhausted every day");
        assert_eq!(estimate.item_scores[3], 3);

        let estimate = estimator().estimate("I usually can't focus at work");
        assert_eq!(estimate.item_scores[6], 2);
    }

    #[test]
    fn test_everyday_down_is_not_low_mood() {
        let estimate = estimator().estimate("I need to download the report, then sit down");
        assert_eq!(estimate.total_score, 0);

        let estimate = estimator().estimate("I've been feeling down");
        assert_eq!(estimate.item_scores[1], 1);
    }

    #[test]
    fn test_qualifier_outside_window_ignored() {
        let padding = "x".repeat(60);
        let text = format!("always {padding} tired");
        assert_eq!(estimator().estimate(&text).item_scores[3], 1);
    }

    #[test]
    fn test_window_respects_multibyte_text() {
        let text = "ééééééééééééééééééééééééé tired ééééééééééééééééééééé";
        assert_eq!(estimator().estimate(text).item_scores[3], 1);
    }

    #[test]
    fn test_maximum_score() {
        let text = "always sad, always no interest, always can't sleep, always exhausted, \
                    always not hungry, always worthless, always can't focus, always restless, \
                    always want to die";
        let estimate = estimator().estimate(text);
        assert_eq!(estimate.total_score, 27);
        assert_eq!(estimate.severity_category, SeverityCategory::Severe);
        assert!((estimate.confidence_level - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_cluster_estimate_distribution() {
        let estimate = estimate_from_cluster(Some(&cluster(16.0)), &assignment(0.5, 0.8));
        // 16 * 0.75 = 12 -> one point each, three spare points to the first items
        assert_eq!(estimate.total_score, 12);
        assert_eq!(estimate.item_scores, vec![2, 2, 2, 1, 1, 1, 1, 1, 1]);
        assert_eq!(estimate.confidence_level, 0.8);
        assert!(estimate.clinical_significance);
    }

    #[test]
    fn test_cluster_estimate_far_from_center() {
        let estimate = estimate_from_cluster(Some(&cluster(18.0)), &assignment(3.0, 0.4));
        assert_eq!(estimate.total_score, 0);
    }

    #[test]
    fn test_reported_estimate_never_below_text_evidence() {
        let keyword = estimator().estimate("I feel so depressed and hopeless every day, I hate myself");
        assert!(keyword.total_score > 0);

        let far = estimate_from_cluster(Some(&cluster(18.0)), &assignment(2.85, 0.1));
        assert_eq!(far.total_score, 0);
        let reported = reported_estimate(keyword.clone(), far);
        assert_eq!(reported, keyword);

        let near = estimate_from_cluster(Some(&cluster(24.0)), &assignment(0.1, 0.9));
        assert!(near.total_score > keyword.total_score);
        let reported = reported_estimate(keyword, near.clone());
        assert_eq!(reported, near);
    }

    #[test]
    fn test_cluster_estimate_without_cluster() {
        let estimate = estimate_from_cluster(None, &assignment(0.0, 0.9));
        assert_eq!(estimate.total_score, 0);
        assert_eq!(estimate.confidence_level, NO_EVIDENCE_CONFIDENCE);
    }
}
