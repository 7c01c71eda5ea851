//! Sandtable Core Library
//!
//! Turn-based wargaming simulations driven by independently-prompted
//! language-model agents, with deterministic world-state transitions and a
//! reproducible metric-scoring engine.
//!
//! The flow: a [`scenario::Scenario`] instantiates a [`world::WorldState`];
//! the [`orchestrator::Orchestrator`] sequences Blue, Red, and Analyst
//! adapter turns over it and streams [`orchestrator::RunEvent`]s; the
//! [`eval::Evaluator`] scores the accumulated transcript into an
//! [`eval::EvaluationResult`].

pub mod actions;
pub mod agents;
pub mod counters;
pub mod error;
pub mod eval;
pub mod fakes;
pub mod obs;
pub mod orchestrator;
pub mod replay;
pub mod reporting;
pub mod resolve;
pub mod scenario;
pub mod telemetry;
pub mod world;

pub use actions::{parse_actions, DeclaredAction};

pub use agents::{
    AgentAdapter, AgentTurn, CompletionClient, CompletionError, OllamaClient, OllamaConfig,
    ToolRegistry, Visibility, WorldView,
};

pub use error::{AdapterError, Result, SandtableError};

pub use eval::benchmarks::{
    get_benchmark, list_benchmarks, BenchmarkCase, BenchmarkInfo, BenchmarkSuite,
};
pub use eval::runner::{BenchmarkReport, BenchmarkRunner, CaseReport};
pub use eval::{
    grade, registry, ConsistencyWindow, EvalContext, EvaluationResult, Evaluator, Metric,
    MetricCategory, MetricEntry, MetricScore,
};

pub use orchestrator::{
    cancel_pair, Orchestrator, RunConfig, RunEvent, RunRecord, RunStatus,
};

pub use replay::{replay, ReplaySummary, ScriptedTurn};

pub use reporting::{
    render_benchmark_summary, render_evaluation_summary, write_benchmark_json,
    write_evaluation_json,
};

pub use resolve::{ResolutionRules, Termination};

pub use scenario::{MapBounds, Scenario, ScenarioStore};

pub use counters::COUNTERS;
pub use telemetry::init_tracing;

pub use world::{
    LogEntry, Objective, Owner, Posture, RejectedAction, Role, Side, ToolCallRecord, TurnMessage,
    Unit, UnitStatus, UnitType, WorldState,
};

/// Sandtable version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
