//! Text rendering of command results.

use std::fmt::Write;
use std::path::Path;

use serde::Serialize;

use promptlab_core::{RunSummary, ThresholdPolicy, ValidationReport, Verdict};
use promptlab_runtime::{EvaluationRun, OutcomeStatus, PushOutcome};

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub prompt: &'a str,
    pub run: &'a EvaluationRun,
    pub summary: &'a RunSummary,
    pub verdict: &'a Verdict,
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

pub fn validation(file: &Path, name: &str, report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}:{}", mark(report.is_valid), file.display(), name);
    for violation in &report.errors {
        let _ = writeln!(out, "    - {}", violation);
    }
    out
}

pub fn rejection(name: &str, report: &ValidationReport) -> String {
    let mut out = format!("Prompt '{}' was not pushed; fix these issues first:\n", name);
    for violation in &report.errors {
        let _ = writeln!(out, "    - {}", violation);
    }
    out
}

pub fn push_outcome(outcome: &PushOutcome) -> String {
    let mut out = String::new();
    if outcome.created {
        let _ = writeln!(out, "Created repository {}", outcome.reference.full_name());
    }
    let _ = writeln!(out, "Pushed {} (commit {})", outcome.reference.full_name(), outcome.commit_hash);
    let _ = writeln!(out, "Tags: {}", outcome.tags.join(", "));
    let _ = writeln!(out, "View at {}", outcome.url);
    out
}

pub fn run_report(
    name: &str,
    run: &EvaluationRun,
    summary: &RunSummary,
    verdict: &Verdict,
    policy: &ThresholdPolicy,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Evaluating '{}' on {} of {} examples\n",
        name,
        run.outcomes.len(),
        run.total_examples
    );

    for outcome in &run.outcomes {
        let n = outcome.index + 1;
        let _ = match &outcome.status {
            OutcomeStatus::Scored(score) => writeln!(
                out,
                "[{}] Recall: {:.2} F1: {:.2} Precision: {:.2}",
                n, score.recall, score.score, score.precision
            ),
            OutcomeStatus::Skipped { reason } => writeln!(out, "[{}] skipped: {}", n, reason),
            OutcomeStatus::Failed { error } => writeln!(out, "[{}] failed: {}", n, error),
        };
    }

    let _ = writeln!(out, "\nSummary");
    let _ = writeln!(out, "  Mean recall:     {:.4}", summary.mean_recall);
    let _ = writeln!(out, "  Mean F1:         {:.4}", summary.mean_f1);
    let _ = writeln!(out, "  Mean precision:  {:.4}", summary.mean_precision);
    let _ = writeln!(out, "  Examples scored: {}/{}", summary.examples, run.outcomes.len());
    let _ = writeln!(
        out,
        "  Average:         {:.4} {} (min {:.2})",
        summary.overall_average(),
        mark(verdict.average_ok),
        policy.min_average
    );
    let _ = writeln!(
        out,
        "  F1:              {:.4} {} (min {:.2})",
        summary.mean_f1,
        mark(verdict.f1_ok),
        policy.min_f1
    );
    if verdict.recall_on_target {
        let _ = writeln!(out, "  Recall meets the {:.2} target", policy.recall_target);
    } else {
        let _ = writeln!(
            out,
            "  Recall is below the {:.2} target; answers miss reference content",
            policy.recall_target
        );
    }
    let _ = writeln!(
        out,
        "  Tokens:          {} ({} calls, ~${:.4})",
        run.usage.total_tokens, run.usage.llm_calls, run.usage.estimated_cost
    );
    let _ = writeln!(out, "\n{}", if verdict.passed { "PASSED" } else { "FAILED" });
    out
}
