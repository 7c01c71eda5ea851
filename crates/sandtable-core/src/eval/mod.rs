//! Metric-scoring engine: converts free-text agent output into graded,
//! comparable scores.
//!
//! Metrics are registered once in a static registry and never mutated. Every
//! scorer is total over its input domain: a metric that finds no evidence
//! returns a low-confidence score with an explanatory detail string, never
//! an error. Scoring is deterministic given fixed text input.

pub mod benchmarks;
pub mod metrics;
pub mod runner;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sandtable_geo::Position;

use crate::orchestrator::RunRecord;
use crate::scenario::Scenario;
use crate::world::{Role, Side, TurnMessage};

/// Fixed metric categories. Membership is metadata assigned at registration,
/// never derived.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Geospatial,
    Strategic,
    Adversarial,
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MetricCategory::Geospatial => "geospatial",
            MetricCategory::Strategic => "strategic",
            MetricCategory::Adversarial => "adversarial",
        };
        write!(f, "{s}")
    }
}

/// How far back the decision-consistency metric may look when comparing a
/// role's stated intent against its earlier statements.
///
/// Configurable policy rather than a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyWindow {
    /// Compare against the immediately preceding turn only.
    #[default]
    PreviousTurn,
    /// Compare against the full history for that role.
    FullHistory,
}

/// Scenario-derived context the scorers evaluate against.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub scenario_name: String,
    pub objective_names: Vec<String>,
    pub blue_unit_names: Vec<String>,
    pub red_unit_names: Vec<String>,
    /// Named entities (units and objectives) with positions, for
    /// recomputing claimed distances through the geospatial toolkit.
    pub entity_positions: BTreeMap<String, Position>,
    /// Fixed ground-truth distances (km) supplied by a benchmark case, used
    /// when the message names no known entity pair.
    pub ground_truth_distances: BTreeMap<String, f64>,
    pub consistency_window: ConsistencyWindow,
}

impl EvalContext {
    /// Build the context from a scenario's rosters.
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut entity_positions = BTreeMap::new();
        for unit in &scenario.units {
            entity_positions.insert(unit.name.clone(), unit.position.clone());
        }
        for obj in &scenario.objectives {
            entity_positions.insert(obj.name.clone(), obj.position.clone());
        }

        Self {
            scenario_name: scenario.name.clone(),
            objective_names: scenario.objective_names(),
            blue_unit_names: scenario.unit_names(Side::Blue),
            red_unit_names: scenario.unit_names(Side::Red),
            entity_positions,
            ground_truth_distances: BTreeMap::new(),
            consistency_window: ConsistencyWindow::default(),
        }
    }

    /// Context with nothing but a name, for scoring standalone messages.
    pub fn bare(scenario_name: &str) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            ..Self::default()
        }
    }

    /// Add a fixed ground-truth distance.
    pub fn with_ground_truth(mut self, label: &str, km: f64) -> Self {
        self.ground_truth_distances.insert(label.to_string(), km);
        self
    }

    /// Override the consistency window policy.
    pub fn with_consistency_window(mut self, window: ConsistencyWindow) -> Self {
        self.consistency_window = window;
        self
    }
}

/// One scorer invocation's input: the message text plus role-scoped history
/// and the scenario context.
pub struct MetricInput<'a> {
    pub text: &'a str,
    pub role: Option<Role>,
    /// Earlier statements by the same role, oldest first, already windowed
    /// per [`ConsistencyWindow`].
    pub prior_texts: &'a [String],
    pub context: &'a EvalContext,
}

/// Raw output of one scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScore {
    pub score: f64,
    pub detail: String,
    pub evidence: Vec<String>,
}

impl MetricScore {
    pub fn new(score: f64, detail: impl Into<String>) -> Self {
        Self {
            score,
            detail: detail.into(),
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// A registered metric: fixed metadata plus a pure scoring function.
pub struct Metric {
    pub name: &'static str,
    pub category: MetricCategory,
    /// Reserved for weighted aggregates; the category/overall means defined
    /// here are unweighted.
    pub weight: f64,
    scorer: fn(&MetricInput) -> MetricScore,
}

impl Metric {
    /// Run the scorer, clamping into `[0, 1]` so the range invariant holds
    /// for every registered metric regardless of scorer arithmetic.
    pub fn score(&self, input: &MetricInput) -> MetricScore {
        let mut result = (self.scorer)(input);
        result.score = result.score.clamp(0.0, 1.0);
        result
    }
}

static REGISTRY: [Metric; 8] = [
    Metric {
        name: "Distance Accuracy",
        category: MetricCategory::Geospatial,
        weight: 1.0,
        scorer: metrics::distance_accuracy,
    },
    Metric {
        name: "Grid Reference Usage",
        category: MetricCategory::Geospatial,
        weight: 1.0,
        scorer: metrics::grid_reference_usage,
    },
    Metric {
        name: "Terrain Awareness",
        category: MetricCategory::Geospatial,
        weight: 1.0,
        scorer: metrics::terrain_awareness,
    },
    Metric {
        name: "Objective Alignment",
        category: MetricCategory::Strategic,
        weight: 1.0,
        scorer: metrics::objective_alignment,
    },
    Metric {
        name: "Reasoning Structure",
        category: MetricCategory::Strategic,
        weight: 1.0,
        scorer: metrics::reasoning_structure,
    },
    Metric {
        name: "Decision Consistency",
        category: MetricCategory::Strategic,
        weight: 1.0,
        scorer: metrics::decision_consistency,
    },
    Metric {
        name: "Opponent Modeling",
        category: MetricCategory::Adversarial,
        weight: 1.0,
        scorer: metrics::opponent_modeling,
    },
    Metric {
        name: "Multi-Step Planning",
        category: MetricCategory::Adversarial,
        weight: 1.0,
        scorer: metrics::multi_step_planning,
    },
];

/// The process-wide metric registry, fixed at compile time.
pub fn registry() -> &'static [Metric] {
    &REGISTRY
}

/// Fixed, universal score-to-grade mapping.
pub fn grade(score: f64) -> char {
    if score >= 0.9 {
        'A'
    } else if score >= 0.8 {
        'B'
    } else if score >= 0.7 {
        'C'
    } else if score >= 0.6 {
        'D'
    } else {
        'F'
    }
}

/// One metric's row in an evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub metric_name: String,
    pub category: MetricCategory,
    pub score: f64,
    pub grade: char,
    pub detail: String,
    pub evidence: Vec<String>,
}

/// Immutable scored report for one run or message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub model_name: String,
    pub scenario_name: String,
    pub total_turns: u32,
    /// Registry order.
    pub metrics: Vec<MetricEntry>,
    pub category_scores: BTreeMap<String, f64>,
    /// Unweighted mean of the category scores (not of raw metric scores), so
    /// categories with more metrics do not dominate.
    pub overall_score: f64,
    pub overall_percentage: f64,
}

/// Scores transcripts and messages against a fixed context.
pub struct Evaluator {
    context: EvalContext,
    categories: Option<Vec<MetricCategory>>,
}

impl Evaluator {
    pub fn new(context: EvalContext) -> Self {
        Self {
            context,
            categories: None,
        }
    }

    /// Restrict scoring to a subset of categories (benchmark cases do this).
    pub fn with_categories(mut self, categories: &[MetricCategory]) -> Self {
        self.categories = Some(categories.to_vec());
        self
    }

    fn active_metrics(&self) -> Vec<&'static Metric> {
        registry()
            .iter()
            .filter(|m| match &self.categories {
                Some(cats) => cats.contains(&m.category),
                None => true,
            })
            .collect()
    }

    /// Score a full transcript. Each metric averages over all messages; the
    /// decision-consistency history is rebuilt per message from the same
    /// role's earlier turns.
    pub fn score_transcript(
        &self,
        transcript: &[&TurnMessage],
        model_name: &str,
        total_turns: u32,
    ) -> EvaluationResult {
        let mut entries = Vec::new();

        for metric in self.active_metrics() {
            let mut scores: Vec<f64> = Vec::new();
            let mut last: Option<MetricScore> = None;

            if transcript.is_empty() {
                // Degenerate input is still in-domain: score the empty text.
                let input = MetricInput {
                    text: "",
                    role: None,
                    prior_texts: &[],
                    context: &self.context,
                };
                let s = metric.score(&input);
                scores.push(s.score);
                last = Some(s);
            }

            for (index, message) in transcript.iter().enumerate() {
                let prior = self.prior_texts_for(transcript, index);
                let input = MetricInput {
                    text: &message.content,
                    role: Some(message.agent),
                    prior_texts: &prior,
                    context: &self.context,
                };
                let s = metric.score(&input);
                scores.push(s.score);
                last = Some(s);
            }

            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            let last = last.expect("at least one score per metric");
            let detail = if scores.len() == 1 {
                last.detail
            } else {
                format!("mean over {} messages; last: {}", scores.len(), last.detail)
            };

            entries.push(MetricEntry {
                metric_name: metric.name.to_string(),
                category: metric.category,
                score: mean,
                grade: grade(mean),
                detail,
                evidence: last.evidence,
            });
        }

        Self::assemble(entries, model_name, &self.context.scenario_name, total_turns)
    }

    /// Score one standalone message.
    pub fn score_message(&self, message: &TurnMessage, model_name: &str) -> EvaluationResult {
        self.score_transcript(&[message], model_name, 1)
    }

    /// Score a completed (or partial) run record.
    pub fn score_run(&self, record: &RunRecord) -> EvaluationResult {
        self.score_transcript(
            &record.transcript(),
            &record.model_name,
            record.total_turns,
        )
    }

    /// Prior same-role message texts for the message at `index`, windowed by
    /// the configured consistency policy.
    fn prior_texts_for(&self, transcript: &[&TurnMessage], index: usize) -> Vec<String> {
        let role = transcript[index].agent;
        let all: Vec<String> = transcript[..index]
            .iter()
            .filter(|m| m.agent == role)
            .map(|m| m.content.clone())
            .collect();
        match self.context.consistency_window {
            ConsistencyWindow::FullHistory => all,
            ConsistencyWindow::PreviousTurn => all.into_iter().rev().take(1).rev().collect(),
        }
    }

    fn assemble(
        entries: Vec<MetricEntry>,
        model_name: &str,
        scenario_name: &str,
        total_turns: u32,
    ) -> EvaluationResult {
        let mut per_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for entry in &entries {
            per_category
                .entry(entry.category.to_string())
                .or_default()
                .push(entry.score);
        }

        let category_scores: BTreeMap<String, f64> = per_category
            .into_iter()
            .map(|(cat, scores)| {
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                (cat, mean)
            })
            .collect();

        let overall_score = if category_scores.is_empty() {
            0.0
        } else {
            category_scores.values().sum::<f64>() / category_scores.len() as f64
        };

        EvaluationResult {
            model_name: model_name.to_string(),
            scenario_name: scenario_name.to_string(),
            total_turns,
            metrics: entries,
            category_scores,
            overall_score,
            overall_percentage: overall_score * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(role: Role, turn: u32, content: &str) -> TurnMessage {
        TurnMessage {
            agent: role,
            turn,
            timestamp: Utc::now(),
            content: content.to_string(),
            tool_calls: vec![],
        }
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade(0.95), 'A');
        assert_eq!(grade(0.9), 'A');
        assert_eq!(grade(0.85), 'B');
        assert_eq!(grade(0.8), 'B');
        assert_eq!(grade(0.75), 'C');
        assert_eq!(grade(0.65), 'D');
        assert_eq!(grade(0.6), 'D');
        assert_eq!(grade(0.3), 'F');
        assert_eq!(grade(0.0), 'F');
        assert_eq!(grade(1.0), 'A');
    }

    #[test]
    fn test_registry_is_fixed_and_categorised() {
        let registry = registry();
        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry
                .iter()
                .filter(|m| m.category == MetricCategory::Geospatial)
                .count(),
            3
        );
        assert_eq!(
            registry
                .iter()
                .filter(|m| m.category == MetricCategory::Strategic)
                .count(),
            3
        );
        assert_eq!(
            registry
                .iter()
                .filter(|m| m.category == MetricCategory::Adversarial)
                .count(),
            2
        );
    }

    #[test]
    fn test_all_metrics_total_over_degenerate_input() {
        let context = EvalContext::bare("empty");
        let input = MetricInput {
            text: "",
            role: None,
            prior_texts: &[],
            context: &context,
        };
        for metric in registry() {
            let result = metric.score(&input);
            assert!(
                (0.0..=1.0).contains(&result.score),
                "{} out of range on empty input",
                metric.name
            );
            assert!(!result.detail.is_empty(), "{} missing detail", metric.name);
        }
    }

    #[test]
    fn test_overall_is_mean_of_category_means() {
        // Category sizes are uneven (3/3/2), so the category mean and the
        // raw metric mean diverge on lopsided evidence; the aggregate must
        // be the category mean.
        let context = EvalContext::bare("test");
        let evaluator = Evaluator::new(context);
        let msg = message(Role::BlueCommander, 1, "plain text with no evidence");
        let result = evaluator.score_message(&msg, "test-model");

        assert_eq!(result.category_scores.len(), 3);
        let mean_of_categories =
            result.category_scores.values().sum::<f64>() / result.category_scores.len() as f64;
        let mean_of_metrics = result.metrics.iter().map(|m| m.score).sum::<f64>()
            / result.metrics.len() as f64;

        assert!((result.overall_score - mean_of_categories).abs() < 1e-12);
        assert!((mean_of_categories - mean_of_metrics).abs() > 1e-6);
    }

    #[test]
    fn test_category_filter_restricts_metrics() {
        let evaluator = Evaluator::new(EvalContext::bare("test"))
            .with_categories(&[MetricCategory::Geospatial]);
        let msg = message(Role::BlueCommander, 1, "some text");
        let result = evaluator.score_message(&msg, "m");
        assert_eq!(result.metrics.len(), 3);
        assert_eq!(result.category_scores.len(), 1);
        assert!(result.category_scores.contains_key("geospatial"));
    }

    #[test]
    fn test_empty_transcript_is_scorable() {
        let evaluator = Evaluator::new(EvalContext::bare("test"));
        let result = evaluator.score_transcript(&[], "m", 0);
        assert_eq!(result.metrics.len(), 8);
        for entry in &result.metrics {
            assert!((0.0..=1.0).contains(&entry.score));
        }
    }

    #[test]
    fn test_overall_percentage_is_score_times_hundred() {
        let evaluator = Evaluator::new(EvalContext::bare("test"));
        let msg = message(Role::RedCommander, 1, "advance to the strait");
        let result = evaluator.score_message(&msg, "m");
        assert!((result.overall_percentage - result.overall_score * 100.0).abs() < 1e-12);
    }
}
