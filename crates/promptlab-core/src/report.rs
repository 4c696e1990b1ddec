//! Run aggregation and the pass/fail policy.
//!
//! Means are taken after every example is scored, so the order examples
//! finish in never affects the summary.

use serde::{Deserialize, Serialize};

use crate::scoring::ScoreResult;

/// Mean scores over a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub examples: usize,
    pub mean_recall: f64,
    pub mean_precision: f64,
    pub mean_f1: f64,
}

impl RunSummary {
    /// Average the results, or `None` for an empty run.
    pub fn aggregate(results: &[ScoreResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let n = results.len() as f64;
        let (recall, precision, f1) = results.iter().fold((0.0, 0.0, 0.0), |acc, r| {
            (acc.0 + r.recall, acc.1 + r.precision, acc.2 + r.score)
        });

        Some(Self {
            examples: results.len(),
            mean_recall: recall / n,
            mean_precision: precision / n,
            mean_f1: f1 / n,
        })
    }

    /// Mean of mean recall, mean precision and mean F1.
    pub fn overall_average(&self) -> f64 {
        (self.mean_recall + self.mean_precision + self.mean_f1) / 3.0
    }
}

/// Thresholds a run must meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Pass when mean F1 reaches this
    pub min_f1: f64,
    /// ...or when the overall average reaches this
    pub min_average: f64,
    /// Advisory only; reported but never fails a run
    pub recall_target: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            min_f1: 0.9,
            min_average: 0.9,
            recall_target: 0.85,
        }
    }
}

/// Policy applied to a summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub f1_ok: bool,
    pub average_ok: bool,
    pub recall_on_target: bool,
}

impl ThresholdPolicy {
    pub fn judge(&self, summary: &RunSummary) -> Verdict {
        let f1_ok = summary.mean_f1 >= self.min_f1;
        let average_ok = summary.overall_average() >= self.min_average;
        Verdict {
            passed: f1_ok || average_ok,
            f1_ok,
            average_ok,
            recall_on_target: summary.mean_recall >= self.recall_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(recall: f64, precision: f64, f1: f64) -> ScoreResult {
        ScoreResult {
            recall,
            precision,
            score: f1,
        }
    }

    #[test]
    fn test_empty_run_has_no_summary() {
        assert!(RunSummary::aggregate(&[]).is_none());
    }

    #[test]
    fn test_means() {
        let summary =
            RunSummary::aggregate(&[score(1.0, 0.5, 0.5), score(0.5, 0.5, 1.0)]).unwrap();
        assert_eq!(summary.examples, 2);
        assert_eq!(summary.mean_recall, 0.75);
        assert_eq!(summary.mean_precision, 0.5);
        assert_eq!(summary.mean_f1, 0.75);
        assert!((summary.overall_average() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = [score(0.2, 0.4, 0.6), score(0.9, 0.1, 0.3), score(0.5, 0.5, 0.5)];
        let mut b = a;
        b.reverse();
        let sa = RunSummary::aggregate(&a).unwrap();
        let sb = RunSummary::aggregate(&b).unwrap();
        assert!((sa.mean_f1 - sb.mean_f1).abs() < 1e-12);
        assert!((sa.mean_recall - sb.mean_recall).abs() < 1e-12);
    }

    #[test]
    fn test_pass_on_f1_alone() {
        let summary = RunSummary::aggregate(&[score(0.5, 0.5, 0.95)]).unwrap();
        let verdict = ThresholdPolicy::default().judge(&summary);
        assert!(verdict.passed);
        assert!(verdict.f1_ok);
        assert!(!verdict.average_ok);
        assert!(!verdict.recall_on_target);
    }

    #[test]
    fn test_pass_on_average_alone() {
        let summary = RunSummary::aggregate(&[score(1.0, 1.0, 0.85)]).unwrap();
        let verdict = ThresholdPolicy::default().judge(&summary);
        assert!(verdict.passed);
        assert!(!verdict.f1_ok);
        assert!(verdict.average_ok);
    }

    #[test]
    fn test_fail_below_both() {
        let summary = RunSummary::aggregate(&[score(0.8, 0.8, 0.8)]).unwrap();
        assert!(!ThresholdPolicy::default().judge(&summary).passed);
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = ThresholdPolicy {
            min_f1: 0.5,
            min_average: 1.0,
            recall_target: 0.0,
        };
        let summary = RunSummary::aggregate(&[score(0.8, 0.8, 0.8)]).unwrap();
        let verdict = policy.judge(&summary);
        assert!(verdict.passed);
        assert!(verdict.recall_on_target);
    }
}
