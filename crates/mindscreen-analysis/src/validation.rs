//! Confusion-matrix validation of cluster risk predictions

use mindscreen_core::{RiskLevel, ValidationMetrics};

const Z_95: f64 = 1.96;

/// 3x3 confusion matrix over {low, medium, high}; rows are actual, columns predicted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    cells: [[usize; 3]; 3],
}

impl ConfusionMatrix {
    pub fn from_labels(predicted: &[RiskLevel], actual: &[RiskLevel]) -> Self {
        let mut cells = [[0; 3]; 3];
        for (p, a) in predicted.iter().zip(actual) {
            cells[a.index()][p.index()] += 1;
        }
        Self { cells }
    }

    pub fn get(&self, actual: RiskLevel, predicted: RiskLevel) -> usize {
        self.cells[actual.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    pub fn trace(&self) -> usize {
        (0..3).map(|i| self.cells[i][i]).sum()
    }

    /// Summed one-vs-rest counts: (tp, fp, fn, tn)
    pub fn one_vs_rest(&self) -> (usize, usize, usize, usize) {
        let n = self.total();
        let (mut tp, mut fp, mut fn_, mut tn) = (0, 0, 0, 0);

        for c in 0..3 {
            let tp_c = self.cells[c][c];
            let column: usize = (0..3).map(|r| self.cells[r][c]).sum();
            let row: usize = self.cells[c].iter().sum();
            let fp_c = column - tp_c;
            let fn_c = row - tp_c;

            tp += tp_c;
            fp += fp_c;
            fn_ += fn_c;
            tn += n - tp_c - fp_c - fn_c;
        }

        (tp, fp, fn_, tn)
    }

    pub fn metrics(&self) -> ValidationMetrics {
        let (tp, fp, fn_, tn) = self.one_vs_rest();
        let n = self.total();

        let sensitivity = ratio(tp, tp + fn_);
        let specificity = ratio(tn, tn + fp);
        let precision = ratio(tp, tp + fp);
        let f1_score = if precision + sensitivity > 0.0 {
            2.0 * precision * sensitivity / (precision + sensitivity)
        } else {
            0.0
        };
        let accuracy = ratio(self.trace(), n);

        ValidationMetrics {
            sensitivity,
            specificity,
            precision,
            recall: sensitivity,
            f1_score,
            accuracy,
            confidence_interval: wald_interval(accuracy, n),
            area_under_curve: 0.5,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// 95% normal-approximation interval, clamped to [0, 1]
pub fn wald_interval(accuracy: f64, n: usize) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }
    let margin = Z_95 * (accuracy * (1.0 - accuracy) / n as f64).sqrt();
    ((accuracy - margin).max(0.0), (accuracy + margin).min(1.0))
}

/// Pairwise concordance over examples whose true labels differ
///
/// A pair ordered the same way by prediction and truth scores 1, a tied
/// prediction scores 0.5. Returns 0.5 when no pair is comparable.
pub fn area_under_curve(predicted: &[RiskLevel], actual: &[RiskLevel]) -> f64 {
    let n = predicted.len().min(actual.len());
    let mut score = 0.0;
    let mut pairs = 0usize;

    for i in 0..n {
        for j in (i + 1)..n {
            if actual[i] == actual[j] {
                continue;
            }
            pairs += 1;
            if actual[i].cmp(&actual[j]) == predicted[i].cmp(&predicted[j]) {
                score += 1.0;
            } else if predicted[i] == predicted[j] {
                score += 0.5;
            }
        }
    }

    if pairs == 0 {
        0.5
    } else {
        score / pairs as f64
    }
}

/// Full metric set for a labeled prediction run
pub fn validate(predicted: &[RiskLevel], actual: &[RiskLevel]) -> ValidationMetrics {
    let mut metrics = ConfusionMatrix::from_labels(predicted, actual).metrics();
    metrics.area_under_curve = area_under_curve(predicted, actual);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use RiskLevel::{High, Low, Medium};

    #[test]
    fn test_perfect_predictions() {
        let labels = [Low, Medium, High, Low, High];
        let metrics = validate(&labels, &labels);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.sensitivity, 1.0);
        assert_eq!(metrics.specificity, 1.0);
        assert_eq!(metrics.f1_score, 1.0);
        assert_eq!(metrics.area_under_curve, 1.0);
        assert_eq!(metrics.confidence_interval, (1.0, 1.0));
    }

    #[test]
    fn test_one_vs_rest_counts() {
        let actual = [Low, Low, Medium, High];
        let predicted = [Low, Medium, Medium, Low];
        let matrix = ConfusionMatrix::from_labels(&predicted, &actual);
        assert_eq!(matrix.get(Low, Medium), 1);
        assert_eq!(matrix.get(High, Low), 1);

        let (tp, fp, fn_, tn) = matrix.one_vs_rest();
        assert_eq!(tp, 2);
        assert_eq!(fp, 2);
        assert_eq!(fn_, 2);
        assert_eq!(tn, 3 * 4 - tp - fp - fn_);

        let metrics = matrix.metrics();
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
    }

    #[test]
    fn test_wald_interval() {
        let (lo, hi) = wald_interval(0.75, 8);
        let margin = 1.96 * (0.75f64 * 0.25 / 8.0).sqrt();
        assert!((lo - (0.75 - margin)).abs() < 1e-12);
        assert_eq!(hi, 1.0);
    }

    #[test]
    fn test_auc_ties_and_no_pairs() {
        assert_eq!(area_under_curve(&[Low, Low], &[Low, Low]), 0.5);
        assert_eq!(area_under_curve(&[Medium, Medium], &[Low, High]), 0.5);
        assert_eq!(area_under_curve(&[High, Low], &[Low, High]), 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        let metrics = validate(&[], &[]);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.confidence_interval, (0.0, 0.0));
        assert_eq!(metrics.area_under_curve, 0.5);
    }
}
