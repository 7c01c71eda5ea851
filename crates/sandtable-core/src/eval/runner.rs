//! Benchmark runner: one independent orchestrated run per case.
//!
//! Cases are isolated: each owns a fresh world instantiated from the shared
//! scenario, and one case's failure never aborts the rest. A failed run's
//! partial transcript is still scored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::agents::CompletionClient;
use crate::error::Result;
use crate::eval::benchmarks::{get_benchmark, BenchmarkCase};
use crate::eval::{grade, EvalContext, EvaluationResult, Evaluator};
use crate::orchestrator::{Orchestrator, RunConfig, RunStatus};
use crate::scenario::ScenarioStore;

/// Scored outcome of one benchmark case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub case_id: String,
    pub case_name: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub result: EvaluationResult,
}

/// Aggregated report for one benchmark execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub benchmark_name: String,
    pub model_name: String,
    pub generated_at: DateTime<Utc>,
    pub cases: Vec<CaseReport>,
    /// Unweighted mean of the per-case overall scores.
    pub aggregate_score: f64,
    pub aggregate_grade: char,
}

/// Runs benchmark suites against a completion client.
pub struct BenchmarkRunner {
    client: Arc<dyn CompletionClient>,
    config: RunConfig,
}

impl BenchmarkRunner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            config: RunConfig::default(),
        }
    }

    /// Override the base run configuration (the per-case turn count is
    /// always taken from the case).
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute a named benchmark suite.
    ///
    /// Fails only for an unknown benchmark name; per-case failures are
    /// recorded in their case reports.
    #[instrument(skip(self))]
    pub async fn run_benchmark(&self, benchmark_name: &str) -> Result<BenchmarkReport> {
        let suite = get_benchmark(benchmark_name)?;
        let model_name = self.client.model_name();
        info!(benchmark = benchmark_name, cases = suite.cases.len(), "starting benchmark");

        let mut reports = Vec::with_capacity(suite.cases.len());
        for case in &suite.cases {
            reports.push(self.run_case(case).await);
        }

        let aggregate_score = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| r.result.overall_score).sum::<f64>() / reports.len() as f64
        };

        info!(
            benchmark = benchmark_name,
            aggregate_score = aggregate_score,
            "benchmark complete"
        );

        Ok(BenchmarkReport {
            benchmark_name: benchmark_name.to_string(),
            model_name,
            generated_at: Utc::now(),
            cases: reports,
            aggregate_score,
            aggregate_grade: grade(aggregate_score),
        })
    }

    async fn run_case(&self, case: &BenchmarkCase) -> CaseReport {
        info!(case = case.id, turns = case.turns, "running benchmark case");

        let scenario = match ScenarioStore::load(case.scenario_id) {
            Ok(s) => s,
            Err(e) => {
                // Catalogue cases ship with valid ids; an unknown id is a
                // configuration error, contained to this case.
                let evaluator = Evaluator::new(EvalContext::bare(case.scenario_id))
                    .with_categories(case.categories);
                return CaseReport {
                    case_id: case.id.to_string(),
                    case_name: case.name.to_string(),
                    status: RunStatus::Failed,
                    error: Some(e.to_string()),
                    result: evaluator.score_transcript(&[], &self.client.model_name(), 0),
                };
            }
        };

        let config = self.config.clone().with_max_turns(case.turns);
        let record = Orchestrator::new(Arc::clone(&scenario), Arc::clone(&self.client), config)
            .run()
            .await;

        let evaluator =
            Evaluator::new(EvalContext::from_scenario(&scenario)).with_categories(case.categories);
        let result = evaluator.score_run(&record);

        CaseReport {
            case_id: case.id.to_string(),
            case_name: case.name.to_string(),
            status: record.status,
            error: record.error,
            result,
        }
    }
}
