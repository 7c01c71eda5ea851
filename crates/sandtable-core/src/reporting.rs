//! Report artifacts: JSON writers and human-readable summaries.

use std::path::Path;

use anyhow::{Context, Result};

use crate::eval::runner::BenchmarkReport;
use crate::eval::EvaluationResult;

/// Write an evaluation result as pretty JSON.
pub fn write_evaluation_json(path: &Path, result: &EvaluationResult) -> Result<()> {
    let content = serde_json::to_string_pretty(result).context("serialize evaluation result")?;
    std::fs::write(path, content).with_context(|| format!("write {path:?}"))?;
    Ok(())
}

/// Write a benchmark report as pretty JSON.
pub fn write_benchmark_json(path: &Path, report: &BenchmarkReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize benchmark report")?;
    std::fs::write(path, content).with_context(|| format!("write {path:?}"))?;
    Ok(())
}

/// Render a human-readable evaluation summary.
pub fn render_evaluation_summary(result: &EvaluationResult) -> String {
    let mut out = String::new();
    out.push_str("=== Evaluation Report ===\n");
    out.push_str(&format!("Model: {}\n", result.model_name));
    out.push_str(&format!("Scenario: {}\n", result.scenario_name));
    out.push_str(&format!("Turns: {}\n\n", result.total_turns));
    out.push_str(&format!(
        "Overall Score: {:.1}%\n\n",
        result.overall_percentage
    ));

    out.push_str("Category Breakdown:\n");
    for (category, score) in &result.category_scores {
        out.push_str(&format!("  {}: {:.1}%\n", category, score * 100.0));
    }

    out.push_str("\nIndividual Metrics:\n");
    for metric in &result.metrics {
        out.push_str(&format!(
            "  [{}] {}: {:.1}%\n",
            metric.grade,
            metric.metric_name,
            metric.score * 100.0
        ));
        if !metric.detail.is_empty() {
            out.push_str(&format!("      {}\n", metric.detail));
        }
    }

    out
}

/// Render a human-readable benchmark summary.
pub fn render_benchmark_summary(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Benchmark: {} ===\nModel: {}\n\n",
        report.benchmark_name, report.model_name
    ));

    for case in &report.cases {
        out.push_str(&format!(
            "[{}] {} ({}): {:.1}%\n",
            crate::eval::grade(case.result.overall_score),
            case.case_name,
            case.status,
            case.result.overall_percentage
        ));
        if let Some(error) = &case.error {
            out.push_str(&format!("      error: {error}\n"));
        }
    }

    out.push_str(&format!(
        "\nAggregate: {:.1}% [{}]\n",
        report.aggregate_score * 100.0,
        report.aggregate_grade
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalContext, Evaluator};
    use crate::world::{Role, TurnMessage};
    use chrono::Utc;

    fn sample_result() -> EvaluationResult {
        let evaluator = Evaluator::new(EvalContext::bare("Taiwan Strait Crisis"));
        let message = TurnMessage {
            agent: Role::BlueCommander,
            turn: 1,
            timestamp: Utc::now(),
            content: "### SITUATION ASSESSMENT\nHold at TW-1001, the strait favors defense."
                .to_string(),
            tool_calls: vec![],
        };
        evaluator.score_message(&message, "llama3.1:8b")
    }

    #[test]
    fn test_summary_contains_grades_and_categories() {
        let summary = render_evaluation_summary(&sample_result());
        assert!(summary.contains("Overall Score:"));
        assert!(summary.contains("geospatial"));
        assert!(summary.contains("Distance Accuracy"));
    }

    #[test]
    fn test_write_evaluation_json_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval_results.json");
        let result = sample_result();

        write_evaluation_json(&path, &result).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let back: EvaluationResult = serde_json::from_str(&raw).unwrap();
        assert_eq!(result, back);
    }
}
